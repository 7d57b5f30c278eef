//! Boolean check box.

use std::any::Any;

use lattice_forms_core::{Property, Signal, Value};

use super::{InputWidget, WidgetBase, WidgetKind};

/// A two-state check box.
pub struct CheckBox {
    base: WidgetBase,
    checked: Property<bool>,

    /// Emitted when the user toggles the box.
    pub value_changed: Signal<Value>,
}

impl Default for CheckBox {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckBox {
    /// Create an unchecked check box.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(),
            checked: Property::new(false),
            value_changed: Signal::new(),
        }
    }

    /// Whether the box is checked.
    pub fn is_checked(&self) -> bool {
        self.checked.get()
    }

    /// Toggle as if clicked.
    pub fn toggle(&self) {
        self.user_edit(Value::Bool(!self.is_checked()));
    }
}

impl InputWidget for CheckBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::CheckBox
    }

    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn value(&self) -> Value {
        Value::Bool(self.checked.get())
    }

    fn set_value(&self, value: Value) {
        self.checked.set_silent(value.as_bool().unwrap_or(false));
    }

    fn value_changed(&self) -> &Signal<Value> {
        &self.value_changed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_emits() {
        let check = CheckBox::new();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        check.value_changed.connect(move |v| seen_clone.lock().push(v.clone()));

        check.toggle();
        check.toggle();
        assert_eq!(*seen.lock(), vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn test_null_reads_unchecked() {
        let check = CheckBox::new();
        check.set_value(Value::Bool(true));
        check.set_value(Value::Null);
        assert!(!check.is_checked());
    }
}
