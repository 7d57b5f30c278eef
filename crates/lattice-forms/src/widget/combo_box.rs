//! Drop-down selection from a list of choices.

use std::any::Any;

use lattice_forms_core::{Property, Signal, Value};
use parking_lot::RwLock;

use super::{InputWidget, WidgetBase, WidgetKind};
use crate::provider::Choice;

/// A combo box whose value is the selected choice's value.
///
/// The value may be set to something not in the list (for example before
/// the choices have loaded); it is kept until the choices are replaced.
pub struct ComboBox {
    base: WidgetBase,
    choices: RwLock<Vec<Choice>>,
    selected: Property<Value>,

    /// Emitted when the user selects a choice.
    pub value_changed: Signal<Value>,
    /// Emitted with the new count when the choice list is replaced.
    pub choices_changed: Signal<usize>,
}

impl Default for ComboBox {
    fn default() -> Self {
        Self::new()
    }
}

impl ComboBox {
    /// Create an empty combo box.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(),
            choices: RwLock::new(Vec::new()),
            selected: Property::new(Value::Null),
            value_changed: Signal::new(),
            choices_changed: Signal::new(),
        }
    }

    /// The current choices.
    pub fn choices(&self) -> Vec<Choice> {
        self.choices.read().clone()
    }

    /// Number of choices.
    pub fn count(&self) -> usize {
        self.choices.read().len()
    }

    /// Replace the choices.
    ///
    /// The selection is kept when an equal value is still offered and reset
    /// to [`Value::Null`] otherwise. Returns whether the selection survived.
    /// Nothing is emitted on [`value_changed`](Self::value_changed).
    pub fn set_choices(&self, choices: Vec<Choice>) -> bool {
        let selected = self.selected.get();
        let kept = selected.is_null() || choices.iter().any(|c| c.value.loosely_equals(&selected));
        let count = choices.len();
        *self.choices.write() = choices;
        if !kept {
            self.selected.set_silent(Value::Null);
        }
        self.choices_changed.emit(count);
        kept
    }

    /// Index of the selected choice.
    pub fn current_index(&self) -> Option<usize> {
        let selected = self.selected.get();
        if selected.is_null() {
            return None;
        }
        self.choices
            .read()
            .iter()
            .position(|c| c.value.loosely_equals(&selected))
    }

    /// Label of the selected choice.
    pub fn current_label(&self) -> Option<String> {
        let index = self.current_index()?;
        self.choices.read().get(index).map(|c| c.label.clone())
    }

    /// Select the choice at `index` as the user would.
    pub fn user_select(&self, index: usize) -> bool {
        let value = match self.choices.read().get(index) {
            Some(choice) => choice.value.clone(),
            None => return false,
        };
        self.user_edit(value)
    }
}

impl InputWidget for ComboBox {
    fn kind(&self) -> WidgetKind {
        WidgetKind::ComboBox
    }

    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn value(&self) -> Value {
        self.selected.get()
    }

    fn set_value(&self, value: Value) {
        self.selected.set_silent(value);
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

    fn choices(names: &[&str]) -> Vec<Choice> {
        names.iter().map(|n| Choice::new(*n, n.to_uppercase())).collect()
    }

    #[test]
    fn test_selection_preserved_when_present() {
        let combo = ComboBox::new();
        combo.set_choices(choices(&["nl", "be", "de"]));
        assert!(combo.user_select(1));
        assert_eq!(combo.value(), Value::from("be"));

        assert!(combo.set_choices(choices(&["be", "fr"])));
        assert_eq!(combo.current_index(), Some(0));
        assert_eq!(combo.current_label().as_deref(), Some("BE"));
    }

    #[test]
    fn test_selection_reset_when_missing() {
        let combo = ComboBox::new();
        combo.set_value(Value::from("nl"));
        assert!(!combo.set_choices(choices(&["be"])));
        assert_eq!(combo.value(), Value::Null);
        assert_eq!(combo.current_index(), None);
    }

    #[test]
    fn test_out_of_range_select() {
        let combo = ComboBox::new();
        assert!(!combo.user_select(3));
    }
}
