//! Validation message display.

use lattice_forms_core::{Property, Signal};

use super::WidgetBase;

/// Shows the validation messages of one input.
///
/// The indicator is hidden while there are no messages.
pub struct ErrorIndicator {
    base: WidgetBase,
    errors: Property<Vec<String>>,

    /// Emitted with the new messages whenever they change.
    pub errors_changed: Signal<Vec<String>>,
}

impl Default for ErrorIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorIndicator {
    /// Create an empty, hidden indicator.
    pub fn new() -> Self {
        let base = WidgetBase::new();
        base.set_visible(false);
        Self {
            base,
            errors: Property::new(Vec::new()),
            errors_changed: Signal::new(),
        }
    }

    /// Shared widget state.
    pub fn base(&self) -> &WidgetBase {
        &self.base
    }

    /// The current messages.
    pub fn errors(&self) -> Vec<String> {
        self.errors.get()
    }

    /// Whether any message is shown.
    pub fn has_errors(&self) -> bool {
        self.errors.with(|e| !e.is_empty())
    }

    /// Replace the messages. Returns `true` if they changed.
    pub fn set_errors(&self, errors: Vec<String>) -> bool {
        let visible = !errors.is_empty();
        if !self.errors.set(errors.clone()) {
            return false;
        }
        self.base.set_visible(visible);
        self.errors_changed.emit(errors);
        true
    }

    /// Remove all messages.
    pub fn clear(&self) -> bool {
        self.set_errors(Vec::new())
    }
}

impl std::fmt::Debug for ErrorIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorIndicator")
            .field("errors", &self.errors())
            .finish()
    }
}
