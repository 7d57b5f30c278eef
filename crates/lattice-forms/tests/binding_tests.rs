//! Tests for binding models to forms.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lattice_forms::factory::{ControlContext, ControlFactory, ValueChanged};
use lattice_forms::layout::PanelContent;
use lattice_forms::widget::{CheckBox, EchoMode, InputWidget, NumberInput, TextInput, WidgetKind};
use lattice_forms::{BinderConfig, FormError, ModelBinder, ModelContext, SharedModel};
use lattice_forms_core::{ColumnSpan, Metadata, Value, ValueKind};
use lattice_forms_macros::Model;

#[derive(Model, Default)]
#[model(
    group(id = 1, title = "Contact", priority = 10),
    group(id = 2, title = "Shipping", priority = 5, span = "half")
)]
struct Order {
    #[field(label = "Customer", description = "Who placed the order")]
    customer: String,
    quantity: u32,
    gift: bool,
    #[field(editor = "multiline")]
    notes: String,
    #[field(group = 1, span = "full")]
    email: String,
    #[field(group = 2)]
    street: String,
    #[field(editor = "password", group = 2)]
    door_code: String,
    #[field(read_only)]
    total: String,
    #[field(exclude)]
    internal_ref: String,
}

fn bind(order: Order) -> lattice_forms::BoundForm {
    ModelBinder::new()
        .bind_model(Arc::new(ModelContext::new(order)))
        .unwrap()
}

fn bind_any(model: impl lattice_forms::Model) -> lattice_forms::BoundForm {
    ModelBinder::new()
        .bind_model(Arc::new(ModelContext::new(model)))
        .unwrap()
}

fn widget(form: &lattice_forms::BoundForm, name: &str) -> Arc<dyn InputWidget> {
    form.item(name).unwrap().widget().clone()
}

#[test]
fn test_controls_follow_property_kinds() {
    let form = bind(Order::default());
    let kinds: Vec<_> = form
        .items()
        .iter()
        .map(|item| (item.property().name(), item.widget().kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("customer", WidgetKind::TextInput),
            ("quantity", WidgetKind::NumberInput),
            ("gift", WidgetKind::CheckBox),
            ("notes", WidgetKind::TextInput),
            ("email", WidgetKind::TextInput),
            ("street", WidgetKind::TextInput),
            ("door_code", WidgetKind::TextInput),
        ]
    );
    assert!(form.item("total").is_none());
    assert!(form.item("internal_ref").is_none());

    let notes = widget(&form, "notes");
    assert!(notes.downcast_ref::<TextInput>().unwrap().is_multiline());
    let door_code = widget(&form, "door_code");
    assert_eq!(
        door_code.downcast_ref::<TextInput>().unwrap().echo_mode(),
        EchoMode::Password
    );
}

#[test]
fn test_labels_tooltips_and_spans() {
    let form = bind(Order::default());
    let customer = form.item("customer").unwrap();
    assert_eq!(customer.label().text(), "Customer");
    assert_eq!(
        customer.widget().base().tooltip().as_deref(),
        Some("Who placed the order")
    );
    assert_eq!(form.item("door_code").unwrap().label().text(), "Door Code");

    assert_eq!(customer.column_span(), ColumnSpan::Half);
    assert_eq!(form.item("notes").unwrap().column_span(), ColumnSpan::Full);
    assert_eq!(form.item("email").unwrap().column_span(), ColumnSpan::Full);
}

#[test]
fn test_label_suffix_and_default_span_from_config() {
    let config = BinderConfig::default()
        .with_label_suffix(":")
        .with_row_height(20.0);
    let config = BinderConfig {
        default_column_span: ColumnSpan::Two,
        ..config
    };
    let form = ModelBinder::with_config(config)
        .bind_model(Arc::new(ModelContext::new(Order::default())))
        .unwrap();
    let quantity = form.item("quantity").unwrap();
    assert_eq!(quantity.label().text(), "Quantity:");
    assert_eq!(quantity.column_span(), ColumnSpan::Two);
    assert_eq!(form.item("notes").unwrap().column_span(), ColumnSpan::Full);
}

#[test]
fn test_groups_are_laid_out_by_priority() {
    let form = bind(Order::default());
    let panel = form.panel();
    assert_eq!(panel.cells().len(), 3);

    // Default group first, then Contact, then Shipping.
    let PanelContent::Panel(default) = &panel.cells()[0].content else {
        panic!("default group should be an untitled panel");
    };
    let names: Vec<_> = default.items().iter().map(|i| i.property().name()).collect();
    assert_eq!(names, ["customer", "quantity", "gift", "notes"]);
    // customer | quantity, gift, notes (full row)
    assert_eq!(default.row_count(), 3);
    assert_eq!(default.height(), 96.0);

    let PanelContent::Group(contact) = &panel.cells()[1].content else {
        panic!("contact should be a group frame");
    };
    assert_eq!(contact.title(), "Contact");
    assert_eq!(panel.cells()[1].column_span, 6);

    let PanelContent::Group(shipping) = &panel.cells()[2].content else {
        panic!("shipping should be a group frame");
    };
    assert_eq!(shipping.title(), "Shipping");
    assert_eq!(panel.cells()[2].column_span, 3);
    assert_eq!(shipping.panel().items().len(), 2);

    assert_eq!(panel.row_count(), 3);
    assert_eq!(panel.cells()[0].height, 96.0);
}

#[derive(Model, Default)]
#[model(
    group(id = 1, title = "First", priority = 20),
    group(id = 2, title = "Second", priority = 20),
    group(id = 3, title = "Top", priority = 40)
)]
struct Survey {
    #[field(group = 1)]
    first: String,
    #[field(group = 2)]
    second: String,
    #[field(group = 3)]
    top: String,
}

#[test]
fn test_equal_priority_groups_keep_declaration_order() {
    let form = bind_any(Survey::default());
    let titles: Vec<_> = form
        .panel()
        .cells()
        .iter()
        .map(|cell| match &cell.content {
            PanelContent::Group(frame) => frame.title().to_string(),
            _ => panic!("every property sits in a titled group"),
        })
        .collect();
    assert_eq!(titles, ["Top", "First", "Second"]);
}

#[derive(Model, Default)]
#[model(group(id = 1, title = "Licence"))]
struct Driver {
    licence: String,
    #[field(group = 1, visible_when(property = "licence", op = "is_set"))]
    number: String,
}

#[test]
fn test_group_with_only_hidden_properties_is_omitted() {
    let form = bind_any(Driver::default());
    assert!(!form.item("number").unwrap().is_visible());
    let cells = form.panel().cells();
    assert_eq!(cells.len(), 1);
    assert!(matches!(cells[0].content, PanelContent::Panel(_)));

    let form = bind_any(Driver {
        licence: "B".into(),
        ..Default::default()
    });
    assert!(form.item("number").unwrap().is_visible());
    assert_eq!(form.panel().cells().len(), 2);
}

#[test]
fn test_widgets_start_with_model_values() {
    let form = bind(Order {
        customer: "Ada".into(),
        quantity: 3,
        gift: true,
        ..Default::default()
    });
    assert_eq!(form.item("customer").unwrap().widget().value(), Value::from("Ada"));
    assert_eq!(form.item("quantity").unwrap().widget().value(), Value::Int(3));
    let gift = widget(&form, "gift");
    assert!(gift.downcast_ref::<CheckBox>().unwrap().is_checked());
    assert!(!form.context().is_modified());
}

#[test]
fn test_user_edit_reaches_model() {
    let form = bind(Order::default());
    let changes = Arc::new(AtomicUsize::new(0));
    let changes_clone = changes.clone();
    form.property_changed().connect(move |change| {
        assert_eq!(change.property.name(), "quantity");
        changes_clone.fetch_add(1, Ordering::SeqCst);
    });

    let quantity = widget(&form, "quantity");
    let quantity = quantity.downcast_ref::<NumberInput>().unwrap();
    assert!(quantity.user_input(4.4));

    assert_eq!(form.context().with_model(|o: &Order| o.quantity), Some(4));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert!(form.context().is_modified());

    // Same value again: the widget does not emit and the model is untouched.
    assert!(!quantity.user_input(4.0));
    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_set_value_matching_model_is_a_no_op() {
    let form = bind(Order {
        quantity: 2,
        ..Default::default()
    });
    let changes = Arc::new(AtomicUsize::new(0));
    let changes_clone = changes.clone();
    form.property_changed().connect(move |_| {
        changes_clone.fetch_add(1, Ordering::SeqCst);
    });

    form.set_value("quantity", Value::Float(2.0)).unwrap();
    assert_eq!(changes.load(Ordering::SeqCst), 0);
    assert!(!form.context().is_modified());
}

#[test]
fn test_set_value_errors() {
    let form = bind(Order::default());
    assert!(matches!(
        form.set_value("total", "12"),
        Err(FormError::UnknownProperty { .. })
    ));
    assert!(matches!(
        form.set_value("quantity", "many"),
        Err(FormError::Meta(_))
    ));
}

#[test]
fn test_rejected_set_value_leaves_widget_unchanged() {
    let form = bind(Order {
        quantity: 3,
        ..Default::default()
    });
    assert!(form.set_value("quantity", Value::Int(-5)).is_err());
    assert_eq!(form.context().with_model(|o: &Order| o.quantity), Some(3));
    assert_eq!(form.item("quantity").unwrap().widget().value(), Value::Int(3));
    assert!(!form.context().is_modified());

    form.set_value("quantity", Value::Int(7)).unwrap();
    assert_eq!(form.item("quantity").unwrap().widget().value(), Value::Int(7));
}

#[test]
fn test_rollback_pushes_values_to_widgets() {
    let form = bind(Order {
        customer: "Ada".into(),
        ..Default::default()
    });
    form.set_value("CUSTOMER", "Grace").unwrap();
    assert_eq!(
        form.context().with_model(|o: &Order| o.customer.clone()).as_deref(),
        Some("Grace")
    );

    form.rollback().unwrap();
    assert_eq!(
        form.context().with_model(|o: &Order| o.customer.clone()).as_deref(),
        Some("Ada")
    );
    assert_eq!(form.item("customer").unwrap().widget().value(), Value::from("Ada"));
    assert!(!form.context().is_modified());
}

#[test]
fn test_commit_then_rollback_keeps_committed_values() {
    let form = bind(Order::default());
    form.set_value("street", "Main St").unwrap();
    form.commit();
    form.set_value("street", "Side St").unwrap();
    form.rollback().unwrap();
    assert_eq!(
        form.item("street").unwrap().widget().value(),
        Value::from("Main St")
    );
}

#[test]
fn test_dispose_disconnects_widgets() {
    let form = bind(Order::default());
    let customer = widget(&form, "customer");
    assert!(form.item("customer").unwrap().control().is_bound());

    form.dispose();
    form.dispose();
    assert!(form.is_disposed());
    assert!(!form.item("customer").unwrap().control().is_bound());

    customer.downcast_ref::<TextInput>().unwrap().user_input("ignored");
    assert_eq!(
        form.context().with_model(|o: &Order| o.customer.clone()).as_deref(),
        Some("")
    );
    assert!(matches!(
        form.set_value("customer", "x"),
        Err(FormError::Disposed)
    ));
}

#[test]
fn test_dropping_form_releases_handlers() {
    #[derive(Model, Default)]
    struct Gate {
        open: bool,
        #[field(enable_when(property = "open", op = "==", value = true))]
        code: String,
    }

    let context = Arc::new(ModelContext::new(Gate::default()));
    let form = ModelBinder::new().bind_model(context.clone()).unwrap();
    assert_eq!(context.handlers().len(), 1);
    drop(form);
    assert!(context.handlers().is_empty());
}

struct UppercaseText;

impl ControlFactory for UppercaseText {
    fn priority(&self) -> i32 {
        200
    }

    fn can_handle(&self, property: &Metadata) -> bool {
        property.value_kind() == ValueKind::Text && property.name() == "customer"
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let forward: ValueChanged = Arc::new(move |property: &Arc<Metadata>, value: Value| {
            let upper = Value::from(value.to_string().to_uppercase());
            on_value_changed(property, upper);
        });
        let widget = Arc::new(TextInput::new());
        Some(
            ControlContext::new(widget, property.clone(), model, forward)
                .with_default_span(ColumnSpan::Four),
        )
    }
}

#[test]
fn test_custom_control_factory_takes_precedence() {
    let mut binder = ModelBinder::new();
    binder.register_control_factory(Arc::new(UppercaseText));
    let form = binder
        .bind_model(Arc::new(ModelContext::new(Order::default())))
        .unwrap();

    let customer = form.item("customer").unwrap();
    assert_eq!(customer.column_span(), ColumnSpan::Four);
    customer
        .widget()
        .downcast_ref::<TextInput>()
        .unwrap()
        .user_input("ada");
    assert_eq!(
        form.context().with_model(|o: &Order| o.customer.clone()).as_deref(),
        Some("ADA")
    );
}
