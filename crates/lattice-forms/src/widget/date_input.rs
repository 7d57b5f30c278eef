//! Calendar date entry.

use std::any::Any;

use chrono::NaiveDate;
use lattice_forms_core::{Property, Signal, Value};

use super::{InputWidget, WidgetBase, WidgetKind};

/// A date picker. An empty picker reads as [`Value::Null`].
pub struct DateInput {
    base: WidgetBase,
    date: Property<Option<NaiveDate>>,

    /// Emitted when the user picks or clears a date.
    pub value_changed: Signal<Value>,
}

impl Default for DateInput {
    fn default() -> Self {
        Self::new()
    }
}

impl DateInput {
    /// Create an empty date input.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(),
            date: Property::new(None),
            value_changed: Signal::new(),
        }
    }

    /// The selected date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date.get()
    }

    /// Pick a date (or clear with `None`) as the user would.
    pub fn user_select(&self, date: Option<NaiveDate>) -> bool {
        self.user_edit(Value::from(date))
    }
}

impl InputWidget for DateInput {
    fn kind(&self) -> WidgetKind {
        WidgetKind::DateInput
    }

    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn value(&self) -> Value {
        Value::from(self.date.get())
    }

    fn set_value(&self, value: Value) {
        self.date.set_silent(value.as_date());
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
    fn test_accepts_text_dates() {
        let input = DateInput::new();
        input.set_value(Value::from("2024-02-29"));
        assert_eq!(input.date(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(input.user_select(None));
        assert_eq!(input.value(), Value::Null);
    }
}
