//! Factory resolution: metadata in, widgets and behaviors out.
//!
//! Two priority-ordered chains drive binding:
//!
//! - [`ControlFactory`] chain: the **first** factory that can handle a
//!   property creates its input control. A property no factory handles is
//!   skipped.
//! - [`WatchFactory`] chain: **every** factory is asked, and every handler
//!   returned is registered.
//!
//! # Priorities
//!
//! Higher priorities are consulted first; equal priorities keep registration
//! order. Built-in type-driven factories use `0`, annotation-driven ones
//! `100`, and the catch-all fallback `-100`, so a custom factory registered
//! at `200` overrides every built-in for the properties it accepts.

mod control;
mod watch;

use std::fmt;
use std::sync::Arc;

pub use control::{
    CheckControlFactory, ChoiceControlFactory, ControlContext, ControlFactory,
    DateControlFactory, FallbackControlFactory, MultilineControlFactory, NumberControlFactory,
    PasswordControlFactory, TextControlFactory, ValueChanged,
};
pub use watch::{
    ComputedWatchFactory, ConditionWatchFactory, DropdownWatchFactory, ValidationWatchFactory,
    WatchFactory,
};

/// Something with a sort priority.
pub trait Prioritized {
    /// Higher runs first.
    fn priority(&self) -> i32;
}

impl Prioritized for dyn ControlFactory {
    fn priority(&self) -> i32 {
        ControlFactory::priority(self)
    }
}

impl Prioritized for dyn WatchFactory {
    fn priority(&self) -> i32 {
        WatchFactory::priority(self)
    }
}

/// Factories sorted by descending priority, ties in registration order.
pub struct FactoryChain<F: ?Sized> {
    entries: Vec<Arc<F>>,
}

impl<F: ?Sized + Prioritized> Default for FactoryChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized + Prioritized> FactoryChain<F> {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert after every factory of greater or equal priority.
    pub fn register(&mut self, factory: Arc<F>) {
        let priority = factory.priority();
        let index = self
            .entries
            .iter()
            .position(|f| f.priority() < priority)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, factory);
    }

    /// Factories in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<F>> {
        self.entries.iter()
    }

    /// Number of factories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: ?Sized> Clone for FactoryChain<F> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<F: ?Sized + Prioritized> fmt::Debug for FactoryChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let priorities: Vec<i32> = self.entries.iter().map(|e| e.priority()).collect();
        f.debug_struct("FactoryChain")
            .field("priorities", &priorities)
            .finish()
    }
}

impl FactoryChain<dyn ControlFactory> {
    /// The chain of built-in control factories.
    pub fn builtin_controls() -> Self {
        let mut chain = Self::new();
        let factories: [Arc<dyn ControlFactory>; 8] = [
            Arc::new(TextControlFactory),
            Arc::new(CheckControlFactory),
            Arc::new(NumberControlFactory),
            Arc::new(DateControlFactory),
            Arc::new(MultilineControlFactory),
            Arc::new(PasswordControlFactory),
            Arc::new(ChoiceControlFactory),
            Arc::new(FallbackControlFactory),
        ];
        for factory in factories {
            chain.register(factory);
        }
        chain
    }

    /// The first factory that can handle `property`.
    pub fn resolve(&self, property: &lattice_forms_core::Metadata) -> Option<&Arc<dyn ControlFactory>> {
        self.entries.iter().find(|f| f.can_handle(property))
    }
}
