//! Conditional enabling and visibility.

use std::sync::Arc;

use lattice_forms_core::annotation::{Condition, ConditionTarget};
use lattice_forms_core::{MetaError, Metadata, TypeRegistry};
use parking_lot::Mutex;

use super::{WatchHandler, WatchState};
use crate::context::SharedModel;
use crate::error::Result;
use crate::layout::PropertyGridItem;

/// Enables or shows a widget while conditions on sibling properties hold.
///
/// All `Enabled` conditions must hold for the widget to be enabled, and all
/// `Visible` conditions for it (and its label) to be shown. Ordering
/// comparisons between values without an ordering fail the refresh with
/// [`FormError::Incomparable`](crate::FormError::Incomparable).
pub struct ConditionHandler {
    state: WatchState,
    item: Arc<PropertyGridItem>,
    conditions: Vec<Condition>,
    siblings: Mutex<Vec<Arc<Metadata>>>,
}

impl ConditionHandler {
    /// Create a handler evaluating `conditions`.
    ///
    /// Fails when the owning type is registered and a sibling does not exist.
    pub fn new(item: Arc<PropertyGridItem>, conditions: Vec<Condition>) -> Result<Self> {
        let state = WatchState::new(item.property().clone());
        let owner = TypeRegistry::get(item.property().owner_type());
        for condition in &conditions {
            if let Some(meta) = owner {
                if meta.property(&condition.property).is_none() {
                    return Err(MetaError::unknown_property(meta.type_name(), &condition.property).into());
                }
            }
            state.add_dependency(&condition.property);
        }
        Ok(Self {
            state,
            item,
            conditions,
            siblings: Mutex::new(Vec::new()),
        })
    }

    /// The evaluated conditions.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl WatchHandler for ConditionHandler {
    fn kind(&self) -> &'static str {
        "condition"
    }

    fn state(&self) -> &WatchState {
        &self.state
    }

    fn on_initialize(&self, model: &SharedModel) -> Result<()> {
        let meta = model.meta_object();
        let siblings = self
            .conditions
            .iter()
            .map(|c| {
                meta.property(&c.property)
                    .cloned()
                    .ok_or_else(|| MetaError::unknown_property(meta.type_name(), &c.property))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        *self.siblings.lock() = siblings;
        Ok(())
    }

    fn on_refresh(&self, model: &SharedModel, _first_call: bool) -> Result<()> {
        let siblings = self.siblings.lock().clone();
        let mut enabled = None;
        let mut visible = None;
        {
            let guard = model.read();
            for (condition, sibling) in self.conditions.iter().zip(&siblings) {
                let value = sibling.get_value(&**guard).unwrap_or_default();
                let met = condition.is_met(&value)?;
                let slot = match condition.target {
                    ConditionTarget::Enabled => &mut enabled,
                    ConditionTarget::Visible => &mut visible,
                };
                *slot = Some(slot.unwrap_or(true) && met);
            }
        }

        if let Some(enabled) = enabled {
            self.item.widget().base().set_enabled(enabled);
        }
        if let Some(visible) = visible {
            self.item.set_visible(visible);
        }
        Ok(())
    }
}
