//! Choice lists for drop-down properties.
//!
//! A property annotated with `#[field(dropdown = "countries")]` gets its
//! choices from the [`DropdownProvider`] registered under `"countries"` in
//! the binder's [`ProviderRegistry`]. Providers may answer synchronously or
//! hand back a future; future results are delivered on the UI queue.
//!
//! # Example
//!
//! ```
//! use lattice_forms::provider::{Choice, ChoiceFetch, ProviderRegistry};
//!
//! let registry = ProviderRegistry::new();
//! registry.register_fn("sizes", |_model| {
//!     vec![Choice::new("s", "Small"), Choice::new("l", "Large")]
//! });
//! assert!(registry.get("sizes").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use lattice_forms_core::{Metadata, Model, Value};
use parking_lot::RwLock;

/// One entry of a choice list.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// The value written to the model when selected.
    pub value: Value,
    /// The text shown to the user.
    pub label: String,
}

impl Choice {
    /// Create a choice.
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The answer of [`DropdownProvider::items`].
pub enum ChoiceFetch {
    /// The choices are available now.
    Ready(Vec<Choice>),
    /// The choices arrive later.
    Pending(BoxFuture<'static, Vec<Choice>>),
}

impl ChoiceFetch {
    /// Wrap a future.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Vec<Choice>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }
}

impl fmt::Debug for ChoiceFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(choices) => f.debug_tuple("Ready").field(&choices.len()).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Supplies the choices of a drop-down property.
pub trait DropdownProvider: Send + Sync {
    /// Called once per bound property before the first fetch.
    fn initialize(&self, _property: &Metadata) {}

    /// Extra property names whose changes re-fetch the choices.
    ///
    /// Cascading lists (regions of the selected country) return the parent
    /// property here.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Fetch the choices for the current model state.
    fn items(&self, model: &dyn Model) -> ChoiceFetch;
}

impl<P: DropdownProvider + ?Sized> DropdownProvider for Arc<P> {
    fn initialize(&self, property: &Metadata) {
        (**self).initialize(property)
    }

    fn dependencies(&self) -> Vec<String> {
        (**self).dependencies()
    }

    fn items(&self, model: &dyn Model) -> ChoiceFetch {
        (**self).items(model)
    }
}

/// A fixed list of choices.
#[derive(Debug, Clone, Default)]
pub struct StaticChoices {
    choices: Vec<Choice>,
}

impl StaticChoices {
    /// Create from a list of choices.
    pub fn new(choices: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            choices: choices.into_iter().collect(),
        }
    }
}

impl DropdownProvider for StaticChoices {
    fn items(&self, _model: &dyn Model) -> ChoiceFetch {
        ChoiceFetch::Ready(self.choices.clone())
    }
}

struct FnProvider<F> {
    fetch: F,
    dependencies: Vec<String>,
}

impl<F> DropdownProvider for FnProvider<F>
where
    F: Fn(&dyn Model) -> ChoiceFetch + Send + Sync,
{
    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn items(&self, model: &dyn Model) -> ChoiceFetch {
        (self.fetch)(model)
    }
}

/// Named dropdown providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn DropdownProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, provider: impl DropdownProvider + 'static) {
        self.providers.write().insert(name.into(), Arc::new(provider));
    }

    /// Register a synchronous closure.
    pub fn register_fn<F>(&self, name: impl Into<String>, fetch: F)
    where
        F: Fn(&dyn Model) -> Vec<Choice> + Send + Sync + 'static,
    {
        self.register(
            name,
            FnProvider {
                fetch: move |model: &dyn Model| ChoiceFetch::Ready(fetch(model)),
                dependencies: Vec::new(),
            },
        );
    }

    /// Register a closure returning a [`ChoiceFetch`], re-fetched whenever
    /// one of `dependencies` changes.
    pub fn register_cascading<F, I, S>(&self, name: impl Into<String>, dependencies: I, fetch: F)
    where
        F: Fn(&dyn Model) -> ChoiceFetch + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(
            name,
            FnProvider {
                fetch,
                dependencies: dependencies.into_iter().map(Into::into).collect(),
            },
        );
    }

    /// Look up a provider.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DropdownProvider>> {
        self.providers.read().get(name).cloned()
    }

    /// Whether a provider is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.providers.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ProviderRegistry").field("providers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_replace() {
        let registry = ProviderRegistry::new();
        registry.register("sizes", StaticChoices::new([Choice::new("s", "Small")]));
        assert!(registry.contains("sizes"));
        assert!(!registry.contains("colors"));

        registry.register_cascading("sizes", ["category"], |_| {
            ChoiceFetch::pending(async { vec![Choice::new("xl", "Extra large")] })
        });
        let provider = registry.get("sizes").unwrap();
        assert_eq!(provider.dependencies(), vec!["category".to_string()]);
    }

    #[test]
    fn test_choice_fetch_debug() {
        let ready = ChoiceFetch::Ready(vec![Choice::new(1, "One")]);
        assert_eq!(format!("{ready:?}"), "Ready(1)");
        let pending = ChoiceFetch::pending(async { Vec::new() });
        assert_eq!(format!("{pending:?}"), "Pending");
    }
}
