//! Watch factories: one per built-in behavior.

use std::sync::Arc;
use std::time::Duration;

use lattice_forms_core::UiQueue;
use lattice_forms_core::annotation::{Computed, Condition, Dropdown, Validate};
use lattice_forms_core::async_runtime::{AsyncRuntime, Debouncer};

use crate::layout::PropertyGridItem;
use crate::logging::targets;
use crate::provider::ProviderRegistry;
use crate::rules::RuleRegistry;
use crate::watch::{
    ComputedHandler, ConditionHandler, DropdownHandler, ValidationHandler, WatchHandler,
};

/// Creates watch handlers for grid items.
///
/// Every factory in the chain is consulted for every item; each handler
/// returned is registered with the model context.
pub trait WatchFactory: Send + Sync {
    /// Resolution priority; higher is consulted first.
    fn priority(&self) -> i32 {
        0
    }

    /// Create a handler for `item`, or `None` when this factory does not
    /// apply or its configuration cannot be resolved.
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>>;
}

/// Handles `enable_when` / `visible_when` conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionWatchFactory;

impl WatchFactory for ConditionWatchFactory {
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>> {
        let conditions: Vec<Condition> = item.property().annotations::<Condition>().cloned().collect();
        if conditions.is_empty() {
            return None;
        }
        match ConditionHandler::new(item.clone(), conditions) {
            Ok(handler) => Some(Arc::new(handler)),
            Err(error) => {
                tracing::warn!(
                    target: targets::FACTORY,
                    property = item.property().name(),
                    %error,
                    "condition cannot be resolved; ignoring"
                );
                None
            }
        }
    }
}

/// Handles computed properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputedWatchFactory;

impl WatchFactory for ComputedWatchFactory {
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>> {
        let computed = item.property().annotation::<Computed>().copied()?;
        Some(Arc::new(ComputedHandler::new(item.clone(), computed)))
    }
}

/// Handles drop-down properties by looking up their provider.
#[derive(Debug, Clone)]
pub struct DropdownWatchFactory {
    providers: Arc<ProviderRegistry>,
    runtime: Option<AsyncRuntime>,
    queue: UiQueue,
}

impl DropdownWatchFactory {
    /// Create a factory resolving providers from `providers`.
    ///
    /// Asynchronous providers need `runtime`; their results are delivered
    /// through `queue`.
    pub fn new(providers: Arc<ProviderRegistry>, runtime: Option<AsyncRuntime>, queue: UiQueue) -> Self {
        Self {
            providers,
            runtime,
            queue,
        }
    }
}

impl WatchFactory for DropdownWatchFactory {
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>> {
        let dropdown = item.property().annotation::<Dropdown>()?;
        let Some(provider) = self.providers.get(&dropdown.provider) else {
            tracing::warn!(
                target: targets::FACTORY,
                property = item.property().name(),
                provider = %dropdown.provider,
                "unknown dropdown provider; ignoring"
            );
            return None;
        };
        Some(Arc::new(DropdownHandler::new(
            item.clone(),
            provider,
            self.runtime.clone(),
            self.queue.clone(),
        )))
    }
}

/// Handles validation rules.
#[derive(Debug, Clone)]
pub struct ValidationWatchFactory {
    rules: Arc<RuleRegistry>,
    runtime: Option<AsyncRuntime>,
    queue: UiQueue,
    delay: Duration,
}

impl ValidationWatchFactory {
    /// Create a factory resolving rules from `rules`.
    ///
    /// With a runtime, re-validation after edits waits `delay` after the
    /// last change.
    pub fn new(
        rules: Arc<RuleRegistry>,
        runtime: Option<AsyncRuntime>,
        queue: UiQueue,
        delay: Duration,
    ) -> Self {
        Self {
            rules,
            runtime,
            queue,
            delay,
        }
    }
}

impl WatchFactory for ValidationWatchFactory {
    fn create_instance(&self, item: &Arc<PropertyGridItem>) -> Option<Arc<dyn WatchHandler>> {
        let validate = item.property().annotation::<Validate>()?;
        let property = item.property().name();

        let mut resolved = Vec::with_capacity(validate.0.len());
        for spec in &validate.0 {
            let Some(rule) = self.rules.get(&spec.name) else {
                tracing::warn!(
                    target: targets::FACTORY,
                    property,
                    rule = %spec.name,
                    "unknown validation rule; ignoring validation"
                );
                return None;
            };
            if let Err(reason) = rule.check_argument(spec.argument.as_deref()) {
                tracing::warn!(
                    target: targets::FACTORY,
                    property,
                    rule = %spec.name,
                    %reason,
                    "invalid validation rule argument; ignoring validation"
                );
                return None;
            }
            resolved.push((spec.clone(), rule));
        }

        if item.error_indicator().is_none() {
            tracing::warn!(
                target: targets::FACTORY,
                property,
                "item has no error indicator; ignoring validation"
            );
            return None;
        }

        let debouncer = self
            .runtime
            .as_ref()
            .filter(|_| !self.delay.is_zero())
            .map(|runtime| Debouncer::new(runtime.clone(), self.delay));
        Some(Arc::new(ValidationHandler::new(
            item.clone(),
            resolved,
            debouncer,
            self.queue.clone(),
        )))
    }
}
