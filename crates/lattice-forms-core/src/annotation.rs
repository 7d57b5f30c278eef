//! Declarative annotations attached to model properties.
//!
//! Annotations are plain values stored on [`Metadata`](crate::Metadata) and
//! looked up by type with [`Metadata::annotation`](crate::Metadata::annotation).
//! The built-in ones below drive widget selection and the reactive behaviors
//! of a bound form; any `'static + Send + Sync + Debug` type can be used as a
//! custom annotation for your own factories.
//!
//! # Example
//!
//! ```
//! use lattice_forms_core::annotation::{Annotation, Group, Span, WatchOn};
//! use lattice_forms_core::ColumnSpan;
//!
//! let annotations: Vec<Box<dyn Annotation>> = vec![
//!     Box::new(Group(1)),
//!     Box::new(Span(ColumnSpan::Half)),
//!     Box::new(WatchOn::new(["country"])),
//! ];
//!
//! let group = annotations
//!     .iter()
//!     .find_map(|a| a.downcast_ref::<Group>());
//! assert_eq!(group, Some(&Group(1)));
//! ```

use std::any::Any;
use std::fmt;

use serde::Deserialize;

use crate::error::{MetaError, MetaResult};
use crate::meta::Model;
use crate::value::Value;

/// A declarative annotation on a property.
///
/// Implemented automatically for every `'static + Send + Sync + Debug` type.
pub trait Annotation: Any + Send + Sync + fmt::Debug {
    /// Access the annotation as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Annotation for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Annotation {
    /// Downcast to a concrete annotation type.
    ///
    /// Always call this on the trait object itself; smart pointers such as
    /// `Box<dyn Annotation>` are annotations too and would downcast to themselves.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the annotation is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Number of columns in the form grid.
pub const GRID_COLUMNS: usize = 6;

/// How many of the [`GRID_COLUMNS`] a widget occupies.
///
/// [`ColumnSpan::None`] removes the widget from the layout entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSpan {
    /// Excluded from layout.
    None,
    /// One column.
    One,
    /// Two columns (a third of the row).
    Two,
    /// Three columns (half the row).
    #[default]
    Half,
    /// Four columns (two thirds of the row).
    Four,
    /// Five columns.
    Five,
    /// The whole row.
    Full,
}

impl ColumnSpan {
    /// The number of columns, or `None` when excluded from layout.
    pub fn columns(self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::One => Some(1),
            Self::Two => Some(2),
            Self::Half => Some(3),
            Self::Four => Some(4),
            Self::Five => Some(5),
            Self::Full => Some(GRID_COLUMNS),
        }
    }

    /// Build a span from a column count, clamped into `[1, GRID_COLUMNS]`.
    pub fn from_columns(columns: usize) -> Self {
        match columns.clamp(1, GRID_COLUMNS) {
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Half,
            4 => Self::Four,
            5 => Self::Five,
            _ => Self::Full,
        }
    }

    /// Parse a span name as used in attributes (`"half"`, `"full"`, `"none"`, `"2"`).
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Ok(columns) = name.parse::<usize>() {
            return Some(if columns == 0 {
                Self::None
            } else {
                Self::from_columns(columns)
            });
        }
        match name.to_ascii_lowercase().as_str() {
            "none" | "hidden" => Some(Self::None),
            "one" => Some(Self::One),
            "two" | "third" => Some(Self::Two),
            "half" | "three" => Some(Self::Half),
            "four" => Some(Self::Four),
            "five" => Some(Self::Five),
            "full" | "six" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Id of the built-in default group.
pub const DEFAULT_GROUP_ID: u32 = 0;

/// A named, prioritized bucket of properties rendered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDetail {
    group_id: u32,
    title: String,
    priority: i32,
    column_span: ColumnSpan,
}

impl GroupDetail {
    /// Create a group with priority `0` spanning the full row.
    pub fn new(group_id: u32, title: impl Into<String>) -> Self {
        Self {
            group_id,
            title: title.into(),
            priority: 0,
            column_span: ColumnSpan::Full,
        }
    }

    /// The built-in group every unannotated property belongs to.
    pub fn default_group() -> Self {
        Self {
            group_id: DEFAULT_GROUP_ID,
            title: "Default".to_string(),
            priority: i32::MAX,
            column_span: ColumnSpan::Full,
        }
    }

    /// Set the sort priority (higher renders first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the span of the group's panel in the outer grid.
    pub fn with_column_span(mut self, column_span: ColumnSpan) -> Self {
        self.column_span = column_span;
        self
    }

    /// The group id.
    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    /// The group title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The sort priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The span of the group's panel in the outer grid.
    pub fn column_span(&self) -> ColumnSpan {
        self.column_span
    }

    /// Whether this is the built-in default group.
    pub fn is_default(&self) -> bool {
        self.group_id == DEFAULT_GROUP_ID
    }
}

/// Excludes a property from binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclude;

/// Label text shown next to the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(pub String);

/// Longer help text, surfaced as the widget tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(pub String);

/// Places the property in the group with this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group(pub u32);

/// Overrides the column span of the property's widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span(pub ColumnSpan);

/// Declares the properties whose changes refresh this property's handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOn(pub Vec<String>);

impl WatchOn {
    /// Watch the given property names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

/// Editor style hint for text properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editor {
    /// Multi-line text area.
    Multiline,
    /// Masked single-line input.
    Password,
}

impl Editor {
    /// Parse an editor hint name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "multiline" | "textarea" => Some(Self::Multiline),
            "password" => Some(Self::Password),
            _ => None,
        }
    }
}

/// Bounds for numeric inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumberRange {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// Step used by increment/decrement.
    pub step: Option<f64>,
}

/// Populates the property's choices from a named dropdown provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    /// Name the provider was registered under.
    pub provider: String,
}

impl Dropdown {
    /// Reference the provider registered under `provider`.
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

/// A computed property: the value is derived from the rest of the model.
///
/// Pair it with [`WatchOn`] so the value is recomputed when its inputs change.
#[derive(Clone, Copy)]
pub struct Computed {
    compute: fn(&dyn Any) -> Option<Value>,
}

impl Computed {
    /// Create from a function receiving the model as `Any`.
    pub const fn new(compute: fn(&dyn Any) -> Option<Value>) -> Self {
        Self { compute }
    }

    /// Evaluate against a model. `None` when the model has the wrong type.
    pub fn evaluate(&self, model: &dyn Model) -> Option<Value> {
        (self.compute)(Model::as_any(model))
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed").finish_non_exhaustive()
    }
}

/// A validation rule reference: a rule name and an optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Name the rule evaluator was registered under.
    pub name: String,
    /// Argument passed to the evaluator (`"max_len:20"` has argument `"20"`).
    pub argument: Option<String>,
}

impl RuleSpec {
    /// Parse `name` or `name:argument`.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((name, argument)) => Self {
                name: name.trim().to_string(),
                argument: Some(argument.trim().to_string()),
            },
            None => Self {
                name: spec.trim().to_string(),
                argument: None,
            },
        }
    }
}

/// Validation rules evaluated against the property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validate(pub Vec<RuleSpec>);

impl Validate {
    /// Parse each rule spec.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(rules.into_iter().map(|r| RuleSpec::parse(r.as_ref())).collect())
    }
}

/// Comparison operator used by [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Values are equal.
    Equal,
    /// Values differ.
    NotEqual,
    /// Left is smaller.
    Less,
    /// Left is smaller or equal.
    LessOrEqual,
    /// Left is greater.
    Greater,
    /// Left is greater or equal.
    GreaterOrEqual,
    /// Left carries a non-empty value (right is ignored).
    IsSet,
    /// Left is null or blank (right is ignored).
    IsNotSet,
}

impl Comparison {
    /// Parse an operator, either symbolic (`">="`) or by name (`"ge"`).
    pub fn parse(op: &str) -> Option<Self> {
        match op.trim().to_ascii_lowercase().as_str() {
            "==" | "=" | "eq" => Some(Self::Equal),
            "!=" | "<>" | "ne" => Some(Self::NotEqual),
            "<" | "lt" => Some(Self::Less),
            "<=" | "le" => Some(Self::LessOrEqual),
            ">" | "gt" => Some(Self::Greater),
            ">=" | "ge" => Some(Self::GreaterOrEqual),
            "set" | "is_set" => Some(Self::IsSet),
            "unset" | "is_not_set" => Some(Self::IsNotSet),
            _ => None,
        }
    }

    /// The symbolic form of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::IsSet => "is set",
            Self::IsNotSet => "is not set",
        }
    }

    /// Evaluate `left <op> right`.
    ///
    /// Ordering operators on values without an ordering fail with
    /// [`MetaError::Incomparable`]; that is an annotation mistake, not a data
    /// condition.
    pub fn evaluate(self, left: &Value, right: &Value) -> MetaResult<bool> {
        match self {
            Self::Equal => Ok(left.loosely_equals(right)),
            Self::NotEqual => Ok(!left.loosely_equals(right)),
            Self::IsSet => Ok(!left.is_empty()),
            Self::IsNotSet => Ok(left.is_empty()),
            Self::Less | Self::LessOrEqual | Self::Greater | Self::GreaterOrEqual => {
                let ordering =
                    left.partial_compare(right)
                        .ok_or_else(|| MetaError::Incomparable {
                            left: format!("{left:?}"),
                            right: format!("{right:?}"),
                            op: self.symbol(),
                        })?;
                Ok(match self {
                    Self::Less => ordering.is_lt(),
                    Self::LessOrEqual => ordering.is_le(),
                    Self::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                })
            }
        }
    }
}

/// What a [`Condition`] toggles on the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTarget {
    /// The widget is enabled only while the condition holds.
    Enabled,
    /// The widget is visible only while the condition holds.
    Visible,
}

/// Enables or shows a property's widget depending on a sibling property.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// What the condition toggles.
    pub target: ConditionTarget,
    /// The sibling property compared.
    pub property: String,
    /// The comparison operator.
    pub op: Comparison,
    /// The right-hand operand.
    pub value: Value,
}

impl Condition {
    /// Enable the widget while `property <op> value` holds.
    pub fn enabled_when(property: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            target: ConditionTarget::Enabled,
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    /// Show the widget while `property <op> value` holds.
    pub fn visible_when(property: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self {
            target: ConditionTarget::Visible,
            ..Self::enabled_when(property, op, value)
        }
    }

    /// Evaluate against the sibling's current value.
    pub fn is_met(&self, sibling: &Value) -> MetaResult<bool> {
        self.op.evaluate(sibling, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_span_clamps() {
        assert_eq!(ColumnSpan::from_columns(0), ColumnSpan::One);
        assert_eq!(ColumnSpan::from_columns(9), ColumnSpan::Full);
        assert_eq!(ColumnSpan::None.columns(), None);
        assert_eq!(ColumnSpan::parse("HALF"), Some(ColumnSpan::Half));
        assert_eq!(ColumnSpan::parse("0"), Some(ColumnSpan::None));
        assert_eq!(ColumnSpan::parse("wide"), None);
    }

    #[test]
    fn test_default_group() {
        let group = GroupDetail::default_group();
        assert!(group.is_default());
        assert_eq!(group.title(), "Default");
        assert_eq!(group.priority(), i32::MAX);
        assert_eq!(group.column_span(), ColumnSpan::Full);
    }

    #[test]
    fn test_comparison_ordering() {
        let ge = Comparison::parse(">=").unwrap();
        assert!(ge.evaluate(&Value::Int(18), &Value::Int(18)).unwrap());
        assert!(!ge.evaluate(&Value::Float(17.5), &Value::Int(18)).unwrap());
    }

    #[test]
    fn test_comparison_incomparable_is_error() {
        let err = Comparison::Greater
            .evaluate(&Value::Text("x".into()), &Value::Int(1))
            .unwrap_err();
        assert!(matches!(err, MetaError::Incomparable { op: ">", .. }));
    }

    #[test]
    fn test_equality_never_fails() {
        let eq = Comparison::Equal;
        assert!(!eq.evaluate(&Value::Text("1".into()), &Value::Int(1)).unwrap());
        assert!(Comparison::IsSet.evaluate(&Value::Text("a".into()), &Value::Null).unwrap());
        assert!(Comparison::IsNotSet.evaluate(&Value::Text(" ".into()), &Value::Null).unwrap());
    }

    #[test]
    fn test_rule_spec_parse() {
        let rules = Validate::new(["required", "max_len: 20"]);
        assert_eq!(rules.0[0].name, "required");
        assert_eq!(rules.0[0].argument, None);
        assert_eq!(rules.0[1].name, "max_len");
        assert_eq!(rules.0[1].argument.as_deref(), Some("20"));
    }

    #[test]
    fn test_annotation_downcast() {
        let boxed: Box<dyn Annotation> = Box::new(Dropdown::new("countries"));
        let dropdown = boxed.downcast_ref::<Dropdown>();
        assert_eq!(dropdown.map(|d| d.provider.as_str()), Some("countries"));
        assert!(boxed.downcast_ref::<Group>().is_none());
        assert!(boxed.is::<Dropdown>());
    }
}
