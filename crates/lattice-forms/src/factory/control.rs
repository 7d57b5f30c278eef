//! Control factories and the control context they produce.

use std::fmt;
use std::sync::Arc;

use lattice_forms_core::annotation::{Dropdown, Editor, NumberRange};
use lattice_forms_core::{ColumnSpan, ConnectionId, Metadata, Value, ValueKind};
use parking_lot::Mutex;

use crate::context::SharedModel;
use crate::logging::targets;
use crate::widget::{CheckBox, ComboBox, DateInput, InputWidget, NumberInput, TextInput};

/// Callback invoked with the property and new value when the user edits a
/// control.
pub type ValueChanged = Arc<dyn Fn(&Arc<Metadata>, Value) + Send + Sync>;

/// An input widget bound to one property.
///
/// The context owns the connection between the widget's `value_changed`
/// signal and the binder callback; at most one connection exists at a time.
pub struct ControlContext {
    widget: Arc<dyn InputWidget>,
    property: Arc<Metadata>,
    on_value_changed: ValueChanged,
    connection: Mutex<Option<ConnectionId>>,
    default_span: Option<ColumnSpan>,
}

impl ControlContext {
    /// Wrap `widget`, seeding it with the property's current model value.
    pub fn new(
        widget: Arc<dyn InputWidget>,
        property: Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Self {
        if let Some(value) = model.get(&property) {
            widget.set_value(value);
        }
        Self {
            widget,
            property,
            on_value_changed,
            connection: Mutex::new(None),
            default_span: None,
        }
    }

    /// Suggest a column span used when the property does not specify one.
    pub fn with_default_span(mut self, span: ColumnSpan) -> Self {
        self.default_span = Some(span);
        self
    }

    /// The widget.
    pub fn widget(&self) -> &Arc<dyn InputWidget> {
        &self.widget
    }

    /// The bound property.
    pub fn property(&self) -> &Arc<Metadata> {
        &self.property
    }

    /// The suggested column span.
    pub fn default_span(&self) -> Option<ColumnSpan> {
        self.default_span
    }

    /// Push a value to the widget without notifying the binder.
    pub fn update_value(&self, value: Value) {
        self.widget.set_value(value);
    }

    /// Connect the widget's change signal to the binder callback.
    ///
    /// Returns `false` if already connected.
    pub fn bind_event(&self) -> bool {
        let mut connection = self.connection.lock();
        if connection.is_some() {
            return false;
        }
        let callback = self.on_value_changed.clone();
        let property = self.property.clone();
        *connection = Some(
            self.widget
                .value_changed()
                .connect(move |value| callback(&property, value.clone())),
        );
        true
    }

    /// Disconnect the widget's change signal. Returns `false` if not connected.
    pub fn unbind_event(&self) -> bool {
        match self.connection.lock().take() {
            Some(id) => self.widget.value_changed().disconnect(id),
            None => false,
        }
    }

    /// Whether the change signal is connected.
    pub fn is_bound(&self) -> bool {
        self.connection.lock().is_some()
    }
}

impl fmt::Debug for ControlContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlContext")
            .field("property", &self.property.name())
            .field("widget", &self.widget.kind())
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Creates the input control for a property.
pub trait ControlFactory: Send + Sync {
    /// Resolution priority; higher is consulted first.
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this factory can build a control for `property`.
    fn can_handle(&self, property: &Metadata) -> bool;

    /// Build the control. `None` skips the property.
    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext>;
}

fn plain_text(property: &Metadata) -> bool {
    !property.has_annotation::<Editor>() && !property.has_annotation::<Dropdown>()
}

/// Single-line text for text properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextControlFactory;

impl ControlFactory for TextControlFactory {
    fn can_handle(&self, property: &Metadata) -> bool {
        property.value_kind() == ValueKind::Text && plain_text(property)
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(TextInput::new());
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Check box for boolean properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckControlFactory;

impl ControlFactory for CheckControlFactory {
    fn can_handle(&self, property: &Metadata) -> bool {
        property.value_kind() == ValueKind::Bool && !property.has_annotation::<Dropdown>()
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(CheckBox::new());
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Number input for integer and float properties, honoring [`NumberRange`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberControlFactory;

impl ControlFactory for NumberControlFactory {
    fn can_handle(&self, property: &Metadata) -> bool {
        property.value_kind().is_numeric() && !property.has_annotation::<Dropdown>()
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let input = match property.value_kind() {
            ValueKind::Integer => NumberInput::integer(),
            _ => NumberInput::float(),
        };
        let range = property.annotation::<NumberRange>().copied().unwrap_or_default();
        let widget = Arc::new(input.with_range(range));
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Date picker for date properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateControlFactory;

impl ControlFactory for DateControlFactory {
    fn can_handle(&self, property: &Metadata) -> bool {
        property.value_kind() == ValueKind::Date && !property.has_annotation::<Dropdown>()
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(DateInput::new());
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Multi-line text for [`Editor::Multiline`]; spans the full row.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultilineControlFactory;

impl ControlFactory for MultilineControlFactory {
    fn priority(&self) -> i32 {
        100
    }

    fn can_handle(&self, property: &Metadata) -> bool {
        property.annotation::<Editor>() == Some(&Editor::Multiline)
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(TextInput::multiline().with_target_kind(property.value_kind()));
        Some(
            ControlContext::new(widget, property.clone(), model, on_value_changed)
                .with_default_span(ColumnSpan::Full),
        )
    }
}

/// Masked text for [`Editor::Password`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordControlFactory;

impl ControlFactory for PasswordControlFactory {
    fn priority(&self) -> i32 {
        100
    }

    fn can_handle(&self, property: &Metadata) -> bool {
        property.annotation::<Editor>() == Some(&Editor::Password)
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(TextInput::password().with_target_kind(property.value_kind()));
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Combo box for [`Dropdown`] properties. Choices are filled by the dropdown
/// watch handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceControlFactory;

impl ControlFactory for ChoiceControlFactory {
    fn priority(&self) -> i32 {
        100
    }

    fn can_handle(&self, property: &Metadata) -> bool {
        property.has_annotation::<Dropdown>()
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        let widget = Arc::new(ComboBox::new());
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

/// Text entry converting to the property's kind. Handles anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackControlFactory;

impl ControlFactory for FallbackControlFactory {
    fn priority(&self) -> i32 {
        -100
    }

    fn can_handle(&self, _property: &Metadata) -> bool {
        true
    }

    fn create_control(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: ValueChanged,
    ) -> Option<ControlContext> {
        tracing::trace!(
            target: targets::FACTORY,
            property = property.name(),
            kind = %property.value_kind(),
            "using fallback text control"
        );
        let widget = Arc::new(TextInput::new().with_target_kind(property.value_kind()));
        Some(ControlContext::new(widget, property.clone(), model, on_value_changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_forms_core::{MetaObject, Model};
    use std::any::Any;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Note {
        title: String,
    }

    impl Model for Note {
        fn meta_object(&self) -> &'static MetaObject {
            static META: OnceLock<MetaObject> = OnceLock::new();
            META.get_or_init(|| {
                MetaObject::builder::<Note>("Note")
                    .property(
                        Metadata::builder::<Note, String>("title")
                            .getter(|m| m.downcast_ref::<Note>().map(|n| Value::from(n.title.clone())))
                            .setter(|m, v| {
                                let Some(note) = m.downcast_mut::<Note>() else {
                                    return false;
                                };
                                match v {
                                    Value::Text(text) => {
                                        note.title = text;
                                        true
                                    }
                                    _ => false,
                                }
                            }),
                    )
                    .build()
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_bind_event_is_idempotent() {
        let model = SharedModel::new(Note {
            title: "Draft".into(),
        });
        let property = model.meta_object().property("title").unwrap().clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let callback: ValueChanged = Arc::new(move |_, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        let control = TextControlFactory
            .create_control(&property, &model, callback)
            .unwrap();
        assert_eq!(control.widget().value(), Value::from("Draft"));

        assert!(control.bind_event());
        assert!(!control.bind_event());
        assert_eq!(control.widget().value_changed().connection_count(), 1);

        control.widget().user_edit(Value::from("Final"));
        control.update_value(Value::from("Silent"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(control.unbind_event());
        assert!(!control.unbind_event());
        control.widget().user_edit(Value::from("Ignored"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
