//! Dynamic values exchanged between models and input widgets.
//!
//! Models keep strongly typed fields; widgets and watch handlers work with
//! [`Value`], a small closed set of variants covering everything a form can
//! edit. The [`FieldValue`] trait converts between the two and is what the
//! `#[derive(Model)]` macro relies on when generating accessors.
//!
//! # Example
//!
//! ```
//! use lattice_forms_core::{FieldValue, Value, ValueKind};
//!
//! assert_eq!(42i32.to_value(), Value::Int(42));
//! assert_eq!(<i32 as FieldValue>::KIND, ValueKind::Integer);
//! assert_eq!(i32::from_value(Value::Text("7".into())), Some(7));
//!
//! let missing: Option<u8> = None;
//! assert!(missing.to_value().is_null());
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;

/// Date format used when dates travel as text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The kind of value a property holds, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `true` / `false`.
    Bool,
    /// Signed or unsigned integers of any width.
    Integer,
    /// Floating point numbers.
    Float,
    /// Free text.
    Text,
    /// Calendar dates.
    Date,
}

impl ValueKind {
    /// Whether values of this kind are numeric.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value (an unset optional field or an empty selection).
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// A calendar date.
    Date(NaiveDate),
}

// -2^63 and 2^63, both exact in f64.
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_END_F64: f64 = -(i64::MIN as f64);

impl Value {
    /// The kind of this value, or `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Int(_) => Some(ValueKind::Integer),
            Self::Float(_) => Some(ValueKind::Float),
            Self::Text(_) => Some(ValueKind::Text),
            Self::Date(_) => Some(ValueKind::Date),
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value carries no user content: null or blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as an integer.
    ///
    /// Integral floats convert only when they fit in an `i64`; anything else
    /// is `None` rather than saturated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && (I64_MIN_F64..I64_END_F64).contains(f) => {
                Some(*f as i64)
            }
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow the value as text, without conversion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the value as a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Parse user-entered text into a value of the given kind.
    ///
    /// Blank text parses to [`Value::Null`] for every kind except
    /// [`ValueKind::Text`].
    pub fn parse_as(kind: ValueKind, text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if kind != ValueKind::Text && trimmed.is_empty() {
            return Some(Value::Null);
        }
        match kind {
            ValueKind::Text => Some(Value::Text(text.to_string())),
            ValueKind::Bool => trimmed.parse().ok().map(Value::Bool),
            ValueKind::Integer => trimmed.parse().ok().map(Value::Int),
            ValueKind::Float => trimmed.parse().ok().map(Value::Float),
            ValueKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .map(Value::Date),
        }
    }

    /// Compare two values.
    ///
    /// Numbers compare across `Int`/`Float`; other variants only compare with
    /// themselves. Two nulls are equal. Returns `None` when the values have
    /// no meaningful ordering.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (a, b) if a.kind().is_some_and(ValueKind::is_numeric)
                && b.kind().is_some_and(ValueKind::is_numeric) =>
            {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            _ => None,
        }
    }

    /// Equality that treats `Int(1)` and `Float(1.0)` as the same value.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        self == other || self.partial_compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(text) => f.write_str(text),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Conversion between a typed model field and a [`Value`].
///
/// Implemented for the primitive field types forms can edit. Implement it for
/// your own newtypes to make them bindable.
pub trait FieldValue: Sized {
    /// The kind of value this type maps to.
    const KIND: ValueKind;
    /// Whether the type can represent "no value".
    const NULLABLE: bool = false;

    /// Convert the field into a dynamic value.
    fn to_value(&self) -> Value;

    /// Convert a dynamic value back into the field type.
    ///
    /// Returns `None` when the value cannot be represented.
    fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! impl_field_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: ValueKind = ValueKind::Integer;

                /// Magnitudes beyond `i64` become an approximate float, which
                /// `from_value` refuses to convert back.
                fn to_value(&self) -> Value {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .unwrap_or(Value::Float(*self as f64))
                }

                fn from_value(value: Value) -> Option<Self> {
                    value.as_i64().and_then(|v| <$ty>::try_from(v).ok())
                }
            }
        )*
    };
}

impl_field_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl FieldValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }
}

impl FieldValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(String::new()),
            Value::Text(text) => Some(text),
            other => Some(other.to_string()),
        }
    }
}

impl FieldValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        value.as_date()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn from_value(value: Value) -> Option<Self> {
        let blank = T::KIND != ValueKind::Text && value.is_empty();
        if value.is_null() || blank {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cross_comparison() {
        assert_eq!(
            Value::Int(3).partial_compare(&Value::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert!(Value::Int(1).loosely_equals(&Value::Float(1.0)));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_incomparable_variants() {
        assert_eq!(Value::Text("a".into()).partial_compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.partial_compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.partial_compare(&Value::Null), Some(Ordering::Equal));
    }

    #[test]
    fn test_parse_as() {
        assert_eq!(Value::parse_as(ValueKind::Integer, " 12 "), Some(Value::Int(12)));
        assert_eq!(Value::parse_as(ValueKind::Integer, ""), Some(Value::Null));
        assert_eq!(Value::parse_as(ValueKind::Integer, "abc"), None);
        assert_eq!(
            Value::parse_as(ValueKind::Date, "2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29).map(Value::Date)
        );
        assert_eq!(Value::parse_as(ValueKind::Text, ""), Some(Value::Text(String::new())));
    }

    #[test]
    fn test_integer_field_range_checks() {
        assert_eq!(u8::from_value(Value::Int(255)), Some(255));
        assert_eq!(u8::from_value(Value::Int(256)), None);
        assert_eq!(i32::from_value(Value::Float(4.0)), Some(4));
        assert_eq!(i32::from_value(Value::Float(4.5)), None);
    }

    #[test]
    fn test_large_unsigned_values_do_not_saturate() {
        let big = u64::MAX - 1;
        let value = big.to_value();
        assert!(matches!(value, Value::Float(_)));
        assert_eq!(u64::from_value(value.clone()), None);
        assert_eq!(i64::from_value(value), None);

        let fits = i64::MAX as u64;
        assert_eq!(fits.to_value(), Value::Int(i64::MAX));
        assert_eq!(u64::from_value(fits.to_value()), Some(fits));

        assert_eq!(Value::Float(-9.223_372_036_854_776e18).as_i64(), Some(i64::MIN));
        assert_eq!(Value::Float(9.223_372_036_854_776e18).as_i64(), None);
    }

    #[test]
    fn test_optional_fields() {
        assert_eq!(<Option<i32>>::from_value(Value::Null), Some(None));
        assert_eq!(<Option<i32>>::from_value(Value::Text("  ".into())), Some(None));
        assert_eq!(<Option<i32>>::from_value(Value::Int(5)), Some(Some(5)));
        assert_eq!(
            <Option<String>>::from_value(Value::Text(String::new())),
            Some(Some(String::new()))
        );
        assert!(<Option<i32> as FieldValue>::NULLABLE);
        assert!(!<i32 as FieldValue>::NULLABLE);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        let date = NaiveDate::from_ymd_opt(2020, 1, 5).map(Value::Date).unwrap();
        assert_eq!(date.to_string(), "2020-01-05");
    }
}
