//! Tests for the built-in watch handlers and custom watch factories.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lattice_forms::factory::WatchFactory;
use lattice_forms::layout::PropertyGridItem;
use lattice_forms::provider::{Choice, ChoiceFetch};
use lattice_forms::watch::{WatchHandler, WatchState};
use lattice_forms::widget::{ComboBox, InputWidget};
use lattice_forms::{BoundForm, FormError, ModelBinder, ModelContext, SharedModel};
use lattice_forms_core::{Model, Value};
use lattice_forms_macros::Model;

#[derive(Debug)]
struct Audit;

#[derive(Model, Default)]
struct Applicant {
    first_name: String,
    last_name: String,
    #[field(watch("first_name", "Last_Name"), compute = "compute_full_name")]
    full_name: String,
    age: u32,
    #[field(enable_when(property = "age", op = ">=", value = 18))]
    licence: String,
    #[field(visible_when(property = "licence", op = "is_set"))]
    licence_class: String,
    #[field(dropdown = "countries")]
    country: String,
    #[field(dropdown = "cities")]
    city: String,
    #[field(validate("required", "max_len:5"), annotate = Audit)]
    code: String,
}

impl Applicant {
    fn compute_full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn binder() -> ModelBinder {
    let binder = ModelBinder::new();
    binder.providers().register_fn("countries", |_| {
        vec![Choice::new("NZ", "New Zealand"), Choice::new("AU", "Australia")]
    });
    binder
        .providers()
        .register_cascading("cities", ["country"], |model: &dyn Model| {
            let country = model
                .downcast_ref::<Applicant>()
                .map(|a| a.country.clone())
                .unwrap_or_default();
            let cities: &[&str] = match country.as_str() {
                "NZ" => &["Auckland", "Wellington"],
                "AU" => &["Sydney"],
                _ => &[],
            };
            ChoiceFetch::Ready(cities.iter().map(|c| Choice::new(*c, *c)).collect())
        });
    binder
}

fn bind(applicant: Applicant) -> BoundForm {
    binder()
        .bind_model(Arc::new(ModelContext::new(applicant)))
        .unwrap()
}

fn combo(form: &BoundForm, name: &str) -> Arc<dyn InputWidget> {
    form.item(name).unwrap().widget().clone()
}

#[test]
fn test_enable_condition_follows_sibling() {
    let form = bind(Applicant::default());
    let licence = form.item("licence").unwrap();
    assert!(!licence.widget().base().is_enabled());

    form.set_value("age", 20).unwrap();
    assert!(licence.widget().base().is_enabled());

    form.set_value("age", 17).unwrap();
    assert!(!licence.widget().base().is_enabled());
}

#[test]
fn test_visible_condition_hides_widget_and_label() {
    let form = bind(Applicant::default());
    let class = form.item("licence_class").unwrap();
    assert!(!class.widget().base().is_visible());
    assert!(!class.label().base().is_visible());

    form.set_value("licence", "B").unwrap();
    assert!(class.widget().base().is_visible());
    assert!(class.label().base().is_visible());
}

#[test]
fn test_computed_value_tracks_inputs() {
    let form = bind(Applicant {
        first_name: "Ada".into(),
        ..Default::default()
    });
    assert_eq!(
        form.context().with_model(|a: &Applicant| a.full_name.clone()).as_deref(),
        Some("Ada")
    );

    form.set_value("last_name", "Lovelace").unwrap();
    assert_eq!(
        form.context().with_model(|a: &Applicant| a.full_name.clone()).as_deref(),
        Some("Ada Lovelace")
    );
    assert_eq!(
        form.item("full_name").unwrap().widget().value(),
        Value::from("Ada Lovelace")
    );
}

#[test]
fn test_static_dropdown_keeps_selection() {
    let form = bind(Applicant {
        country: "AU".into(),
        ..Default::default()
    });
    let country = combo(&form, "country");
    let country = country.downcast_ref::<ComboBox>().unwrap();
    assert_eq!(country.count(), 2);
    assert_eq!(country.current_label().as_deref(), Some("Australia"));
}

#[test]
fn test_cascading_dropdown_refreshes_on_dependency() {
    let form = bind(Applicant {
        country: "NZ".into(),
        city: "Wellington".into(),
        ..Default::default()
    });
    let city = combo(&form, "city");
    let city = city.downcast_ref::<ComboBox>().unwrap();
    assert_eq!(city.count(), 2);
    assert_eq!(city.current_index(), Some(1));

    let country = combo(&form, "country");
    assert!(country.downcast_ref::<ComboBox>().unwrap().user_select(1));
    assert_eq!(
        form.context().with_model(|a: &Applicant| a.country.clone()).as_deref(),
        Some("AU")
    );

    assert_eq!(city.choices(), vec![Choice::new("Sydney", "Sydney")]);
    assert_eq!(city.current_index(), None);
    // The model keeps its value until the user picks a new city.
    assert_eq!(
        form.context().with_model(|a: &Applicant| a.city.clone()).as_deref(),
        Some("Wellington")
    );
}

#[test]
fn test_unknown_provider_leaves_combo_empty() {
    let form = ModelBinder::new()
        .bind_model(Arc::new(ModelContext::new(Applicant::default())))
        .unwrap();
    let country = combo(&form, "country");
    assert_eq!(country.downcast_ref::<ComboBox>().unwrap().count(), 0);
}

#[test]
fn test_validation_messages() {
    let form = bind(Applicant::default());
    assert!(!form.is_valid());
    assert_eq!(form.errors(), vec![("code", vec!["Code is required".to_string()])]);
    let indicator = form.item("code").unwrap().error_indicator().unwrap();
    assert!(indicator.base().is_visible());

    form.set_value("code", "ABCDEFG").unwrap();
    assert_eq!(
        form.item("code").unwrap().errors(),
        ["Code must be at most 5 characters"]
    );

    form.set_value("code", "ABC").unwrap();
    assert!(form.is_valid());
    assert!(!indicator.base().is_visible());
    assert!(form.validate_now().unwrap());
}

#[test]
fn test_items_without_rules_have_no_indicator() {
    let form = bind(Applicant::default());
    assert!(form.item("first_name").unwrap().error_indicator().is_none());
}

#[derive(Model, Default)]
struct Mismatch {
    name: String,
    #[field(enable_when(property = "name", op = ">", value = 5))]
    flag: bool,
}

#[test]
fn test_incomparable_condition_fails_binding() {
    let context = Arc::new(ModelContext::new(Mismatch::default()));
    let error = ModelBinder::new().bind_model(context.clone()).unwrap_err();
    assert!(matches!(error, FormError::Incomparable { op: ">", .. }));
    assert!(context.handlers().is_empty());
}

#[derive(Model, Default)]
struct Dangling {
    #[field(enable_when(property = "missing", op = "is_set"))]
    flag: bool,
    #[field(validate("no_such_rule"))]
    code: String,
}

#[test]
fn test_unresolvable_handlers_are_skipped() {
    let context = Arc::new(ModelContext::new(Dangling::default()));
    let form = ModelBinder::new().bind_model(context.clone()).unwrap();
    assert!(context.handlers().is_empty());
    assert!(form.item("flag").unwrap().widget().base().is_enabled());
    assert!(form.is_valid());
}

struct AuditHandler {
    state: WatchState,
    refreshes: Arc<AtomicUsize>,
}

impl WatchHandler for AuditHandler {
    fn kind(&self) -> &'static str {
        "audit"
    }

    fn state(&self) -> &WatchState {
        &self.state
    }

    fn on_refresh(&self, _model: &SharedModel, _first_call: bool) -> lattice_forms::Result<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct AuditFactory {
    refreshes: Arc<AtomicUsize>,
}

impl WatchFactory for AuditFactory {
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>> {
        item.property().annotation::<Audit>()?;
        let state = WatchState::new(item.property().clone());
        state.add_dependency("first_name");
        Some(Arc::new(AuditHandler {
            state,
            refreshes: self.refreshes.clone(),
        }))
    }
}

#[test]
fn test_custom_watch_factory() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let mut binder = binder();
    binder.register_watch_factory(Arc::new(AuditFactory {
        refreshes: refreshes.clone(),
    }));
    let form = binder
        .bind_model(Arc::new(ModelContext::new(Applicant::default())))
        .unwrap();
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    form.set_value("first_name", "Ada").unwrap();
    assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    form.set_value("age", 3).unwrap();
    assert_eq!(refreshes.load(Ordering::SeqCst), 2);
}
