//! Spin-box style numeric entry.

use std::any::Any;

use lattice_forms_core::annotation::NumberRange;
use lattice_forms_core::{Property, Signal, Value};

use super::{InputWidget, WidgetBase, WidgetKind};

/// A numeric input with optional bounds and step.
///
/// User input is clamped into the range and, for integer inputs, rounded.
/// Programmatic values are stored as given.
pub struct NumberInput {
    base: WidgetBase,
    value: Property<Value>,
    range: NumberRange,
    integer: bool,

    /// Emitted when the user changes the number.
    pub value_changed: Signal<Value>,
}

impl NumberInput {
    /// Create an integer input.
    pub fn integer() -> Self {
        Self::with_kind(true)
    }

    /// Create a floating point input.
    pub fn float() -> Self {
        Self::with_kind(false)
    }

    fn with_kind(integer: bool) -> Self {
        Self {
            base: WidgetBase::new(),
            value: Property::new(Value::Null),
            range: NumberRange::default(),
            integer,
            value_changed: Signal::new(),
        }
    }

    /// Set the bounds and step.
    pub fn with_range(mut self, range: NumberRange) -> Self {
        self.range = range;
        self
    }

    /// The bounds and step.
    pub fn range(&self) -> NumberRange {
        self.range
    }

    /// Whether values are whole numbers.
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    /// The step used by [`step_by`](Self::step_by).
    pub fn step(&self) -> f64 {
        self.range.step.unwrap_or(1.0)
    }

    /// Enter a number as if typed by the user.
    pub fn user_input(&self, number: f64) -> bool {
        self.user_edit(self.normalize(number))
    }

    /// Move by `steps` increments as if the user pressed the arrows.
    pub fn step_by(&self, steps: i32) -> bool {
        let current = self.value.with(|v| v.as_f64()).unwrap_or(0.0);
        self.user_input(current + self.step() * f64::from(steps))
    }

    fn normalize(&self, number: f64) -> Value {
        let mut number = number;
        if let Some(min) = self.range.min {
            number = number.max(min);
        }
        if let Some(max) = self.range.max {
            number = number.min(max);
        }
        if self.integer {
            Value::Int(number.round() as i64)
        } else {
            Value::Float(number)
        }
    }
}

impl InputWidget for NumberInput {
    fn kind(&self) -> WidgetKind {
        WidgetKind::NumberInput
    }

    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn value(&self) -> Value {
        self.value.get()
    }

    fn set_value(&self, value: Value) {
        self.value.set_silent(value);
    }

    fn value_changed(&self) -> &Signal<Value> {
        &self.value_changed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
