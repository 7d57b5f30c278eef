//! Rule-based validation with debounced re-checks.

use std::sync::Arc;

use lattice_forms_core::annotation::RuleSpec;
use lattice_forms_core::async_runtime::Debouncer;
use lattice_forms_core::{UiQueue, Value};

use super::{WatchHandler, WatchState};
use crate::context::SharedModel;
use crate::error::Result;
use crate::layout::PropertyGridItem;
use crate::logging::targets;
use crate::rules::{RuleEvaluator, ValidationContext};

struct Validator {
    item: Arc<PropertyGridItem>,
    rules: Vec<(RuleSpec, Arc<dyn RuleEvaluator>)>,
    label: String,
}

impl Validator {
    fn run(&self, model: &SharedModel) -> Vec<String> {
        let property = self.item.property();
        let messages: Vec<String> = {
            let guard = model.read();
            let value = property.get_value(&**guard).unwrap_or(Value::Null);
            self.rules
                .iter()
                .flat_map(|(spec, rule)| {
                    let context = ValidationContext {
                        property,
                        model: &**guard,
                        argument: spec.argument.as_deref(),
                        label: &self.label,
                    };
                    rule.evaluate(&value, &context)
                })
                .collect()
        };
        tracing::trace!(
            target: targets::WATCH,
            property = property.name(),
            errors = messages.len(),
            "validated"
        );
        if let Some(indicator) = self.item.error_indicator() {
            indicator.set_errors(messages.clone());
        }
        messages
    }
}

/// Evaluates validation rules and shows the messages on the item's error
/// indicator.
///
/// The first refresh validates immediately. Later refreshes are debounced
/// when a [`Debouncer`] is present: only the last edit within the delay is
/// validated, on the UI queue. [`flush`](WatchHandler::flush) validates
/// immediately and cancels a pending check.
pub struct ValidationHandler {
    state: WatchState,
    validator: Arc<Validator>,
    debouncer: Option<Debouncer>,
    queue: UiQueue,
}

impl ValidationHandler {
    /// Create a handler for `item` evaluating `rules` in order.
    pub fn new(
        item: Arc<PropertyGridItem>,
        rules: Vec<(RuleSpec, Arc<dyn RuleEvaluator>)>,
        debouncer: Option<Debouncer>,
        queue: UiQueue,
    ) -> Self {
        let label = item.property().display_name();
        Self {
            state: WatchState::new(item.property().clone()),
            validator: Arc::new(Validator { item, rules, label }),
            debouncer,
            queue,
        }
    }

    /// Whether a debounced check is waiting.
    pub fn is_pending(&self) -> bool {
        self.debouncer.as_ref().is_some_and(Debouncer::is_pending)
    }
}

impl WatchHandler for ValidationHandler {
    fn kind(&self) -> &'static str {
        "validation"
    }

    fn state(&self) -> &WatchState {
        &self.state
    }

    fn on_refresh(&self, model: &SharedModel, first_call: bool) -> Result<()> {
        match &self.debouncer {
            Some(debouncer) if !first_call => {
                let validator = self.validator.clone();
                let model = model.clone();
                debouncer.schedule(&self.queue, move || {
                    validator.run(&model);
                });
            }
            _ => {
                self.validator.run(model);
            }
        }
        Ok(())
    }

    fn flush(&self, model: &SharedModel) -> Result<()> {
        if let Some(debouncer) = &self.debouncer {
            debouncer.cancel();
        }
        self.validator.run(model);
        Ok(())
    }

    fn dispose(&self) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.cancel();
        }
    }
}
