//! State shared by every widget.

use lattice_forms_core::{Property, Signal, ThreadAffinity};

/// Enabled, visible and tooltip state plus the owning thread.
///
/// Setters emit the matching signal only when the state actually changes.
pub struct WidgetBase {
    affinity: ThreadAffinity,
    enabled: Property<bool>,
    visible: Property<bool>,
    tooltip: Property<Option<String>>,

    /// Emitted when the enabled state changes.
    pub enabled_changed: Signal<bool>,
    /// Emitted when the visibility changes.
    pub visible_changed: Signal<bool>,
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBase {
    /// Create an enabled, visible base owned by the current thread.
    pub fn new() -> Self {
        Self {
            affinity: ThreadAffinity::current(),
            enabled: Property::new(true),
            visible: Property::new(true),
            tooltip: Property::new(None),
            enabled_changed: Signal::new(),
            visible_changed: Signal::new(),
        }
    }

    /// The thread that created the widget.
    pub fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }

    /// Whether the widget accepts input.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable the widget.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let changed = self.enabled.set(enabled);
        if changed {
            self.enabled_changed.emit(enabled);
        }
        changed
    }

    /// Whether the widget is shown.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Show or hide the widget.
    pub fn set_visible(&self, visible: bool) -> bool {
        let changed = self.visible.set(visible);
        if changed {
            self.visible_changed.emit(visible);
        }
        changed
    }

    /// The tooltip text.
    pub fn tooltip(&self) -> Option<String> {
        self.tooltip.get()
    }

    /// Set the tooltip text.
    pub fn set_tooltip(&self, tooltip: Option<String>) {
        self.tooltip.set_silent(tooltip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_signals_only_on_change() {
        let base = WidgetBase::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        base.enabled_changed.connect(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!base.set_enabled(true));
        assert!(base.set_enabled(false));
        assert!(!base.set_enabled(false));
        assert!(!base.is_enabled());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(base.affinity().is_same_thread());
    }
}
