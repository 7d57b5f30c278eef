//! Validation rules.
//!
//! A property annotated with `#[field(validate("required", "max_len:40"))]`
//! is checked by the [`RuleEvaluator`]s registered under `required` and
//! `max_len` in the binder's [`RuleRegistry`]. Each evaluator returns the
//! messages to show; an empty list means the value passed.
//!
//! # Built-in Rules
//!
//! | Name | Argument | Fails when |
//! |------|----------|------------|
//! | `required` | | the value is null or blank text |
//! | `min_len` | count | text is shorter than the count |
//! | `max_len` | count | text is longer than the count |
//! | `range` | `min..max` (either side optional) | a number lies outside the bounds |
//! | `pattern` | regular expression | text does not match the whole expression |
//!
//! Every rule except `required` accepts an empty value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lattice_forms_core::{Metadata, Model, Value};
use parking_lot::{Mutex, RwLock};
use regex::Regex;

/// What an evaluator knows about the value being checked.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The property being validated.
    pub property: &'a Metadata,
    /// The whole model, for cross-field rules.
    pub model: &'a dyn Model,
    /// The rule argument (`"40"` in `max_len:40`).
    pub argument: Option<&'a str>,
    /// The label used in messages.
    pub label: &'a str,
}

impl fmt::Debug for ValidationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("property", &self.property.name())
            .field("argument", &self.argument)
            .field("label", &self.label)
            .finish()
    }
}

/// Checks a value and describes what is wrong with it.
pub trait RuleEvaluator: Send + Sync {
    /// Return the failure messages, or an empty list when the value is valid.
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String>;

    /// Check a rule argument when the rule is attached to a property.
    ///
    /// An error here disables the rule for that property.
    fn check_argument(&self, _argument: Option<&str>) -> Result<(), String> {
        Ok(())
    }
}

impl<R: RuleEvaluator + ?Sized> RuleEvaluator for Arc<R> {
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        (**self).evaluate(value, context)
    }

    fn check_argument(&self, argument: Option<&str>) -> Result<(), String> {
        (**self).check_argument(argument)
    }
}

/// Fails on null and blank text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredRule;

impl RuleEvaluator for RequiredRule {
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        if value.is_empty() {
            vec![format!("{} is required", context.label)]
        } else {
            Vec::new()
        }
    }
}

/// Bounds the number of characters of a text value.
#[derive(Debug, Clone, Copy)]
pub enum LengthRule {
    /// At least this many characters.
    Min,
    /// At most this many characters.
    Max,
}

impl LengthRule {
    fn limit(argument: Option<&str>) -> Result<usize, String> {
        let argument = argument.ok_or_else(|| "a character count is required".to_string())?;
        argument
            .trim()
            .parse()
            .map_err(|_| format!("'{argument}' is not a character count"))
    }
}

impl RuleEvaluator for LengthRule {
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        if value.is_empty() {
            return Vec::new();
        }
        let Ok(limit) = Self::limit(context.argument) else {
            return Vec::new();
        };
        let length = value.to_string().chars().count();
        match self {
            Self::Min if length < limit => {
                vec![format!("{} must be at least {limit} characters", context.label)]
            }
            Self::Max if length > limit => {
                vec![format!("{} must be at most {limit} characters", context.label)]
            }
            _ => Vec::new(),
        }
    }

    fn check_argument(&self, argument: Option<&str>) -> Result<(), String> {
        Self::limit(argument).map(|_| ())
    }
}

/// Bounds a numeric value: `range:0..130`, `range:1..`, `range:..9.5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeRule;

impl RangeRule {
    fn bounds(argument: Option<&str>) -> Result<(Option<f64>, Option<f64>), String> {
        let argument = argument.ok_or_else(|| "bounds 'min..max' are required".to_string())?;
        let (min, max) = argument
            .split_once("..")
            .ok_or_else(|| format!("'{argument}' is not of the form 'min..max'"))?;
        let parse = |bound: &str| -> Result<Option<f64>, String> {
            let bound = bound.trim();
            if bound.is_empty() {
                return Ok(None);
            }
            bound
                .parse()
                .map(Some)
                .map_err(|_| format!("'{bound}' is not a number"))
        };
        Ok((parse(min)?, parse(max)?))
    }
}

impl RuleEvaluator for RangeRule {
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        if value.is_empty() {
            return Vec::new();
        }
        let Ok((min, max)) = Self::bounds(context.argument) else {
            return Vec::new();
        };
        let Some(number) = value.as_f64() else {
            return vec![format!("{} must be a number", context.label)];
        };
        let label = context.label;
        match (min, max) {
            (Some(min), Some(max)) if number < min || number > max => {
                vec![format!("{label} must be between {min} and {max}")]
            }
            (Some(min), None) if number < min => vec![format!("{label} must be at least {min}")],
            (None, Some(max)) if number > max => vec![format!("{label} must be at most {max}")],
            _ => Vec::new(),
        }
    }

    fn check_argument(&self, argument: Option<&str>) -> Result<(), String> {
        Self::bounds(argument).map(|_| ())
    }
}

/// Requires text to match a regular expression in full.
#[derive(Default)]
pub struct PatternRule {
    compiled: Mutex<HashMap<String, Regex>>,
}

impl PatternRule {
    fn regex(&self, pattern: &str) -> Result<Regex, String> {
        let mut compiled = self.compiled.lock();
        if let Some(regex) = compiled.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| e.to_string())?;
        compiled.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }
}

impl RuleEvaluator for PatternRule {
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        if value.is_empty() {
            return Vec::new();
        }
        let Some(Ok(regex)) = context.argument.map(|p| self.regex(p)) else {
            return Vec::new();
        };
        if regex.is_match(&value.to_string()) {
            Vec::new()
        } else {
            vec![format!("{} has an invalid format", context.label)]
        }
    }

    fn check_argument(&self, argument: Option<&str>) -> Result<(), String> {
        let pattern = argument.ok_or_else(|| "a regular expression is required".to_string())?;
        self.regex(pattern).map(|_| ())
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRule")
            .field("cached", &self.compiled.lock().len())
            .finish()
    }
}

struct FnRule<F>(F);

impl<F> RuleEvaluator for FnRule<F>
where
    F: Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync,
{
    fn evaluate(&self, value: &Value, context: &ValidationContext<'_>) -> Vec<String> {
        (self.0)(value, context).into_iter().collect()
    }
}

/// Named rule evaluators.
pub struct RuleRegistry {
    rules: RwLock<HashMap<String, Arc<dyn RuleEvaluator>>>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Create a registry holding the built-in rules.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register("required", RequiredRule);
        registry.register("min_len", LengthRule::Min);
        registry.register("max_len", LengthRule::Max);
        registry.register("range", RangeRule);
        registry.register("pattern", PatternRule::default());
        registry
    }

    /// Create a registry without any rules.
    pub fn empty() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Register `rule` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, rule: impl RuleEvaluator + 'static) {
        self.rules.write().insert(name.into(), Arc::new(rule));
    }

    /// Register a closure returning at most one message.
    pub fn register_fn<F>(&self, name: impl Into<String>, rule: F)
    where
        F: Fn(&Value, &ValidationContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.register(name, FnRule(rule));
    }

    /// Look up a rule.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RuleEvaluator>> {
        self.rules.read().get(name).cloned()
    }

    /// Whether a rule is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.read().contains_key(name)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.rules.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}
