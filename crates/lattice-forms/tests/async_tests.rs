//! Tests for asynchronous drop-down providers and debounced validation.

use std::sync::Arc;
use std::time::Duration;

use lattice_forms::provider::{Choice, ChoiceFetch, DropdownProvider};
use lattice_forms::widget::ComboBox;
use lattice_forms::{BinderConfig, FormError, ModelBinder, ModelContext};
use lattice_forms_core::Model;
use lattice_forms_macros::Model;

#[derive(Model, Default)]
struct Trip {
    #[field(dropdown = "countries")]
    country: String,
    #[field(dropdown = "regions")]
    region: String,
}

/// Answers slowly for New Zealand and quickly for everything else.
struct SlowRegions;

impl DropdownProvider for SlowRegions {
    fn dependencies(&self) -> Vec<String> {
        vec!["country".into()]
    }

    fn items(&self, model: &dyn Model) -> ChoiceFetch {
        let country = model
            .downcast_ref::<Trip>()
            .map(|trip| trip.country.clone())
            .unwrap_or_default();
        ChoiceFetch::pending(async move {
            let (delay, regions): (u64, &[&str]) = match country.as_str() {
                "NZ" => (60, &["Canterbury", "Otago"]),
                "AU" => (10, &["Victoria"]),
                _ => (10, &[]),
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            regions.iter().map(|r| Choice::new(*r, *r)).collect()
        })
    }
}

fn binder() -> ModelBinder {
    let binder = ModelBinder::new();
    binder.providers().register_fn("countries", |_| {
        vec![Choice::new("NZ", "New Zealand"), Choice::new("AU", "Australia")]
    });
    binder.providers().register("regions", SlowRegions);
    binder
}

#[tokio::test]
async fn test_async_choices_arrive_through_queue() {
    let form = binder()
        .bind_model(Arc::new(ModelContext::new(Trip {
            country: "AU".into(),
            region: "Victoria".into(),
        })))
        .unwrap();
    let region = form.item("region").unwrap().widget().clone();
    let region = region.downcast_ref::<ComboBox>().unwrap();
    assert_eq!(region.count(), 0);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(region.count(), 0);
    assert_eq!(form.process_pending(), 1);

    assert_eq!(region.count(), 1);
    assert_eq!(region.current_label().as_deref(), Some("Victoria"));
}

#[tokio::test]
async fn test_superseded_fetch_is_discarded() {
    let form = binder()
        .bind_model(Arc::new(ModelContext::new(Trip {
            country: "NZ".into(),
            ..Default::default()
        })))
        .unwrap();
    // The slow NZ request is still running when the country changes.
    form.set_value("country", "AU").unwrap();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(form.process_pending(), 2);

    let region = form.item("region").unwrap().widget().clone();
    let region = region.downcast_ref::<ComboBox>().unwrap();
    assert_eq!(region.choices(), vec![Choice::new("Victoria", "Victoria")]);
}

#[tokio::test]
async fn test_dispose_drops_fetches_in_flight() {
    let form = binder()
        .bind_model(Arc::new(ModelContext::new(Trip {
            country: "AU".into(),
            ..Default::default()
        })))
        .unwrap();
    let region = form.item("region").unwrap().widget().clone();
    form.dispose();

    tokio::time::sleep(Duration::from_millis(40)).await;
    form.process_pending();
    assert_eq!(region.downcast_ref::<ComboBox>().unwrap().count(), 0);
}

#[test]
fn test_pending_fetch_without_runtime_fails() {
    let context = Arc::new(ModelContext::new(Trip::default()));
    let error = binder().bind_model(context.clone()).unwrap_err();
    assert!(matches!(error, FormError::Handler { ref property, .. } if property == "region"));
    assert!(context.handlers().is_empty());
}

#[derive(Model, Default)]
struct Account {
    #[field(validate("required", "min_len:3"))]
    username: String,
}

fn debounced_binder(delay: Duration) -> ModelBinder {
    ModelBinder::with_config(BinderConfig::default().with_validation_debounce(delay))
}

#[tokio::test]
async fn test_validation_is_debounced() {
    let form = debounced_binder(Duration::from_millis(30))
        .bind_model(Arc::new(ModelContext::new(Account::default())))
        .unwrap();
    // The first check runs while binding.
    assert_eq!(form.errors(), vec![("username", vec!["Username is required".to_string()])]);

    form.set_value("username", "a").unwrap();
    form.set_value("username", "ad").unwrap();
    form.set_value("username", "ada").unwrap();
    assert!(!form.is_valid());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(form.process_pending(), 1);
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_validate_now_skips_the_delay() {
    let form = debounced_binder(Duration::from_millis(30))
        .bind_model(Arc::new(ModelContext::new(Account {
            username: "ada".into(),
        })))
        .unwrap();
    assert!(form.is_valid());

    form.set_value("username", "ad").unwrap();
    assert!(form.is_valid());
    assert!(!form.validate_now().unwrap());
    assert_eq!(
        form.item("username").unwrap().errors(),
        ["Username must be at least 3 characters"]
    );

    // The cancelled check never runs.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(form.process_pending(), 0);
}

#[tokio::test]
async fn test_zero_delay_validates_immediately() {
    let form = debounced_binder(Duration::ZERO)
        .bind_model(Arc::new(ModelContext::new(Account::default())))
        .unwrap();
    form.set_value("username", "ada").unwrap();
    assert!(form.is_valid());
}

#[tokio::test]
async fn test_without_runtime_validates_immediately() {
    let form = debounced_binder(Duration::from_millis(30))
        .without_runtime()
        .bind_model(Arc::new(ModelContext::new(Account::default())))
        .unwrap();
    form.set_value("username", "ada").unwrap();
    assert!(form.is_valid());
}
