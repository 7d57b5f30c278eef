//! Snapshot of property values for commit and rollback.

use std::sync::Arc;

use lattice_forms_core::{Metadata, Value};

use super::SharedModel;

/// Property values captured at bind, commit or rollback time.
#[derive(Debug, Default)]
pub(crate) struct Transaction {
    snapshot: Vec<(Arc<Metadata>, Value)>,
}

impl Transaction {
    /// Capture the current value of every property.
    pub(crate) fn capture(properties: &[Arc<Metadata>], model: &SharedModel) -> Self {
        let guard = model.read();
        let snapshot = properties
            .iter()
            .filter_map(|p| p.get_value(&**guard).map(|v| (p.clone(), v)))
            .collect();
        Self { snapshot }
    }

    /// Write the captured values back, returning the properties that changed.
    pub(crate) fn restore(&self, model: &SharedModel) -> Vec<(Arc<Metadata>, Value)> {
        let mut guard = model.write();
        let mut restored = Vec::new();
        for (property, value) in &self.snapshot {
            if property.get_value(&**guard).as_ref() == Some(value) {
                continue;
            }
            if property.set_value(&mut **guard, value.clone()) {
                restored.push((property.clone(), value.clone()));
            }
        }
        restored
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.len()
    }
}
