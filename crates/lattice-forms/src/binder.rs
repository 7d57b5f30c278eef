//! Binding models to forms.
//!
//! [`ModelBinder`] walks a [`ModelContext`] group by group, resolves an
//! input control for every bindable property through the control factory
//! chain, attaches the watch handlers every watch factory offers, and lays
//! the result out on a six-column grid. The returned [`BoundForm`] owns the
//! widgets and keeps model and widgets in sync until it is disposed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use lattice_forms::{BinderConfig, ModelBinder, ModelContext};
//! use lattice_forms_core::Value;
//! use lattice_forms_macros::Model;
//!
//! #[derive(Model, Default)]
//! struct Signup {
//!     #[field(validate("required"))]
//!     email: String,
//!     newsletter: bool,
//! }
//!
//! let binder = ModelBinder::with_config(BinderConfig::default().with_label_suffix(":"));
//! let form = binder.bind_model(Arc::new(ModelContext::new(Signup::default()))).unwrap();
//!
//! assert_eq!(form.item("email").unwrap().label().text(), "Email:");
//! assert!(!form.is_valid());
//!
//! form.set_value("email", Value::from("ada@example.com")).unwrap();
//! assert!(form.is_valid());
//! assert!(form.context().is_modified());
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use lattice_forms_core::annotation::{Description, Span, Validate};
use lattice_forms_core::async_runtime::AsyncRuntime;
use lattice_forms_core::{Metadata, PerfSpan, Signal, UiQueue, Value};

use crate::config::BinderConfig;
use crate::context::{ModelContext, SharedModel};
use crate::error::{FormError, Result};
use crate::factory::{
    ComputedWatchFactory, ConditionWatchFactory, ControlFactory, DropdownWatchFactory,
    FactoryChain, ValidationWatchFactory, ValueChanged, WatchFactory,
};
use crate::layout::{GridLayout, GroupFrame, Panel, PanelContent, PropertyGridItem};
use crate::logging::targets;
use crate::provider::ProviderRegistry;
use crate::rules::RuleRegistry;

/// A model value changed through a bound form.
#[derive(Debug, Clone)]
pub struct PropertyChange {
    /// The changed property.
    pub property: Arc<Metadata>,
    /// The value written to the model.
    pub value: Value,
}

/// Turns model contexts into bound forms.
///
/// The binder carries the factory chains, the provider and rule registries,
/// and the queue and runtime used for asynchronous work. One binder can bind
/// any number of models.
pub struct ModelBinder {
    config: BinderConfig,
    controls: FactoryChain<dyn ControlFactory>,
    watches: FactoryChain<dyn WatchFactory>,
    providers: Arc<ProviderRegistry>,
    rules: Arc<RuleRegistry>,
    queue: UiQueue,
    runtime: Option<AsyncRuntime>,
}

impl Default for ModelBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBinder {
    /// Create a binder with the default configuration.
    ///
    /// The calling thread becomes the UI thread. If it runs inside a tokio
    /// runtime, that runtime is used for asynchronous work.
    pub fn new() -> Self {
        Self::with_config(BinderConfig::default())
    }

    /// Create a binder with `config`.
    pub fn with_config(config: BinderConfig) -> Self {
        Self {
            config,
            controls: FactoryChain::builtin_controls(),
            watches: FactoryChain::new(),
            providers: Arc::new(ProviderRegistry::new()),
            rules: Arc::new(RuleRegistry::new()),
            queue: UiQueue::new(),
            runtime: AsyncRuntime::current().ok(),
        }
    }

    /// Use `runtime` for asynchronous providers and debounced validation.
    pub fn with_runtime(mut self, runtime: AsyncRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Run everything synchronously, even inside a tokio runtime.
    pub fn without_runtime(mut self) -> Self {
        self.runtime = None;
        self
    }

    /// Deliver asynchronous results through `queue`.
    pub fn with_queue(mut self, queue: UiQueue) -> Self {
        self.queue = queue;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// The drop-down provider registry.
    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    /// The validation rule registry.
    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    /// The queue asynchronous results are delivered through.
    pub fn queue(&self) -> &UiQueue {
        &self.queue
    }

    /// The async runtime, if any.
    pub fn runtime(&self) -> Option<&AsyncRuntime> {
        self.runtime.as_ref()
    }

    /// Add a control factory to the chain.
    pub fn register_control_factory(&mut self, factory: Arc<dyn ControlFactory>) {
        self.controls.register(factory);
    }

    /// Add a watch factory, consulted alongside the built-in ones.
    pub fn register_watch_factory(&mut self, factory: Arc<dyn WatchFactory>) {
        self.watches.register(factory);
    }

    fn watch_chain(&self) -> FactoryChain<dyn WatchFactory> {
        let builtins: [Arc<dyn WatchFactory>; 4] = [
            Arc::new(ConditionWatchFactory),
            Arc::new(ComputedWatchFactory),
            Arc::new(DropdownWatchFactory::new(
                self.providers.clone(),
                self.runtime.clone(),
                self.queue.clone(),
            )),
            Arc::new(ValidationWatchFactory::new(
                self.rules.clone(),
                self.runtime.clone(),
                self.queue.clone(),
                self.config.validation_debounce(),
            )),
        ];
        let mut chain = FactoryChain::new();
        for factory in builtins.into_iter().chain(self.watches.iter().cloned()) {
            chain.register(factory);
        }
        chain
    }

    /// Bind `context` and lay out its properties.
    ///
    /// Every watch handler is refreshed once while binding. If a handler
    /// fails, everything bound so far is released again and the error is
    /// returned.
    #[tracing::instrument(skip_all, target = "lattice_forms::binder", level = "debug")]
    pub fn bind_model(&self, context: Arc<ModelContext>) -> Result<BoundForm> {
        let _perf = PerfSpan::new("bind_model");
        let property_changed = Arc::new(Signal::new());
        let on_value_changed = edit_callback(&context, &property_changed);

        let mut items = Vec::new();
        match self.build(&context, &on_value_changed, &mut items) {
            Ok(panel) => {
                context.commit();
                tracing::debug!(
                    target: targets::BINDER,
                    type_name = context.model().meta_object().type_name(),
                    items = items.len(),
                    rows = panel.row_count(),
                    "bound model"
                );
                Ok(BoundForm {
                    context,
                    panel,
                    items,
                    property_changed,
                    queue: self.queue.clone(),
                    disposed: AtomicBool::new(false),
                })
            }
            Err(error) => {
                for item in &items {
                    item.control().unbind_event();
                }
                context.clear();
                tracing::debug!(target: targets::BINDER, %error, "binding failed");
                Err(error)
            }
        }
    }

    fn build(
        &self,
        context: &ModelContext,
        on_value_changed: &ValueChanged,
        items: &mut Vec<Arc<PropertyGridItem>>,
    ) -> Result<Panel> {
        let watches = self.watch_chain();
        let layout = GridLayout::new(self.config.row_height);
        let mut sections = Vec::new();

        for entry in context.group_entries() {
            let mut group_items = Vec::new();
            for property in entry.properties() {
                let Some(item) = self.create_item(property, context.model(), on_value_changed)
                else {
                    continue;
                };
                item.control().bind_event();
                items.push(item.clone());
                for factory in watches.iter() {
                    if let Some(handler) = factory.create_instance(&item) {
                        context.register_context(handler)?;
                    }
                }
                group_items.push(item);
            }

            if !group_items.iter().any(|item| item.is_visible()) {
                tracing::trace!(
                    target: targets::BINDER,
                    group = entry.group().title(),
                    "no visible properties; omitting group"
                );
                continue;
            }
            let panel = layout.arrange_items(group_items);
            if panel.is_empty() {
                continue;
            }
            let group = entry.group();
            let content = if group.is_default() {
                PanelContent::Panel(panel)
            } else {
                PanelContent::Group(GroupFrame::new(
                    group.title(),
                    panel,
                    self.config.group_title_height,
                ))
            };
            sections.push((content, group.column_span()));
        }

        Ok(layout.compose(sections))
    }

    fn create_item(
        &self,
        property: &Arc<Metadata>,
        model: &SharedModel,
        on_value_changed: &ValueChanged,
    ) -> Option<Arc<PropertyGridItem>> {
        let Some(factory) = self.controls.resolve(property) else {
            tracing::trace!(
                target: targets::BINDER,
                property = property.name(),
                "no control factory; skipping"
            );
            return None;
        };
        let Some(control) = factory.create_control(property, model, on_value_changed.clone())
        else {
            tracing::trace!(
                target: targets::BINDER,
                property = property.name(),
                "control factory declined; skipping"
            );
            return None;
        };

        let span = property
            .annotation::<Span>()
            .map(|span| span.0)
            .or(control.default_span())
            .unwrap_or(self.config.default_column_span);
        if let Some(Description(text)) = property.annotation::<Description>() {
            control.widget().base().set_tooltip(Some(text.clone()));
        }

        let label = format!("{}{}", property.display_name(), self.config.label_suffix);
        let mut item = PropertyGridItem::new(control, label, span);
        if property.has_annotation::<Validate>() {
            item = item.with_error_indicator();
        }
        Some(Arc::new(item))
    }
}

impl fmt::Debug for ModelBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBinder")
            .field("config", &self.config)
            .field("controls", &self.controls)
            .field("watches", &self.watches)
            .field("providers", &self.providers)
            .field("rules", &self.rules)
            .field("runtime", &self.runtime)
            .finish()
    }
}

// The context is held weakly: its handlers hold the items, which hold this
// callback.
fn edit_callback(
    context: &Arc<ModelContext>,
    property_changed: &Arc<Signal<PropertyChange>>,
) -> ValueChanged {
    let context: Weak<ModelContext> = Arc::downgrade(context);
    let property_changed = property_changed.clone();
    Arc::new(move |property: &Arc<Metadata>, value: Value| {
        let Some(context) = context.upgrade() else {
            return;
        };
        if let Err(error) = apply_edit(&context, &property_changed, property, value) {
            tracing::error!(
                target: targets::BINDER,
                property = property.name(),
                %error,
                "failed to apply edit"
            );
        }
    })
}

/// Write an edited value to the model and refresh everything depending on it.
fn apply_edit(
    context: &ModelContext,
    property_changed: &Signal<PropertyChange>,
    property: &Arc<Metadata>,
    value: Value,
) -> Result<()> {
    if write_edit(context, property, &value)? {
        announce_edit(context, property_changed, property, value)?;
    }
    Ok(())
}

/// Store `value` in the model. `false` when it already holds an equal value.
fn write_edit(context: &ModelContext, property: &Arc<Metadata>, value: &Value) -> Result<bool> {
    let current = context.model().get(property).unwrap_or(Value::Null);
    if current.loosely_equals(value) {
        tracing::trace!(target: targets::BINDER, property = property.name(), "value unchanged");
        return Ok(false);
    }
    context.model().try_set(property, value.clone())?;
    Ok(true)
}

fn announce_edit(
    context: &ModelContext,
    property_changed: &Signal<PropertyChange>,
    property: &Arc<Metadata>,
    value: Value,
) -> Result<()> {
    property_changed.emit(PropertyChange {
        property: property.clone(),
        value: value.clone(),
    });
    context.notify_property_changed(property.name(), &value)
}

/// A model bound to a laid out set of widgets.
///
/// Dropping the form disposes it.
pub struct BoundForm {
    context: Arc<ModelContext>,
    panel: Panel,
    items: Vec<Arc<PropertyGridItem>>,
    property_changed: Arc<Signal<PropertyChange>>,
    queue: UiQueue,
    disposed: AtomicBool,
}

impl BoundForm {
    /// The root panel.
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Every bound item, in binding order.
    pub fn items(&self) -> &[Arc<PropertyGridItem>] {
        &self.items
    }

    /// The item bound to property `name`, ignoring case.
    pub fn item(&self, name: &str) -> Option<&Arc<PropertyGridItem>> {
        self.items.iter().find(|item| item.property().matches_name(name))
    }

    /// The model context.
    pub fn context(&self) -> &Arc<ModelContext> {
        &self.context
    }

    /// The bound model.
    pub fn model(&self) -> &SharedModel {
        self.context.model()
    }

    /// Emitted after an edit was written to the model.
    pub fn property_changed(&self) -> &Signal<PropertyChange> {
        &self.property_changed
    }

    /// Edit property `name` as if the user changed its widget.
    ///
    /// Unlike edits made through a widget, handler errors are returned.
    pub fn set_value(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.is_disposed() {
            return Err(FormError::Disposed);
        }
        let item = self
            .item(name)
            .ok_or_else(|| FormError::unknown_property(name))?;
        let value = value.into();
        if !write_edit(&self.context, item.property(), &value)? {
            return Ok(());
        }
        item.control().update_value(value.clone());
        announce_edit(&self.context, &self.property_changed, item.property(), value)
    }

    /// Make the current model values the new baseline.
    pub fn commit(&self) {
        self.context.commit();
    }

    /// Restore the baseline values, push them to the widgets and refresh
    /// every handler.
    pub fn rollback(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(FormError::Disposed);
        }
        for (property, value) in self.context.rollback() {
            if let Some(item) = self.items.iter().find(|item| **item.property() == *property) {
                item.control().update_value(value);
            }
        }
        self.context.refresh_all()
    }

    /// Validate every property immediately, skipping pending debounces.
    ///
    /// Returns whether the form is valid.
    pub fn validate_now(&self) -> Result<bool> {
        let mut first_error = None;
        for handler in self.context.handlers() {
            if let Err(error) = handler.flush(self.context.model()) {
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(self.is_valid()),
        }
    }

    /// Current validation messages, per property with errors.
    pub fn errors(&self) -> Vec<(&'static str, Vec<String>)> {
        self.items
            .iter()
            .map(|item| (item.property().name(), item.errors()))
            .filter(|(_, errors)| !errors.is_empty())
            .collect()
    }

    /// Whether no item shows a validation message.
    pub fn is_valid(&self) -> bool {
        self.items.iter().all(|item| item.errors().is_empty())
    }

    /// Run asynchronous results waiting on the UI queue.
    pub fn process_pending(&self) -> usize {
        self.queue.process_pending()
    }

    /// Whether [`dispose`](Self::dispose) ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Disconnect every widget and release every handler.
    ///
    /// Idempotent. A panic during teardown is logged and suppressed.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let teardown = panic::catch_unwind(AssertUnwindSafe(|| {
            for item in &self.items {
                item.control().unbind_event();
            }
            self.context.clear()
        }));
        match teardown {
            Ok(handlers) => {
                tracing::debug!(target: targets::BINDER, handlers, "disposed form");
            }
            Err(_) => {
                tracing::error!(target: targets::BINDER, "panic while disposing form; suppressed");
            }
        }
    }
}

impl Drop for BoundForm {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for BoundForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundForm")
            .field("context", &self.context)
            .field("items", &self.items.len())
            .field("rows", &self.panel.row_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
