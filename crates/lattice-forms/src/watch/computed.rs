//! Derived property values.

use std::sync::Arc;

use lattice_forms_core::annotation::Computed;

use super::{WatchHandler, WatchState};
use crate::context::SharedModel;
use crate::error::{FormError, Result};
use crate::layout::PropertyGridItem;
use crate::logging::targets;

/// Recomputes a property from the rest of the model.
///
/// When the computed value differs from the stored one it is written to the
/// model, and the widget is updated silently.
pub struct ComputedHandler {
    state: WatchState,
    item: Arc<PropertyGridItem>,
    computed: Computed,
}

impl ComputedHandler {
    /// Create a handler for `item` computing with `computed`.
    pub fn new(item: Arc<PropertyGridItem>, computed: Computed) -> Self {
        Self {
            state: WatchState::new(item.property().clone()),
            item,
            computed,
        }
    }
}

impl WatchHandler for ComputedHandler {
    fn kind(&self) -> &'static str {
        "computed"
    }

    fn state(&self) -> &WatchState {
        &self.state
    }

    fn on_refresh(&self, model: &SharedModel, _first_call: bool) -> Result<()> {
        let property = self.item.property();
        let (computed, current) = {
            let guard = model.read();
            (self.computed.evaluate(&**guard), property.get_value(&**guard))
        };
        let Some(value) = computed else {
            tracing::trace!(target: targets::WATCH, property = property.name(), "nothing computed");
            return Ok(());
        };

        if current.as_ref() != Some(&value) {
            model.try_set(property, value.clone()).map_err(FormError::from)?;
        }
        if self.item.widget().value() != value {
            self.item.control().update_value(value);
        }
        Ok(())
    }
}
