//! Static text shown next to an input.

use lattice_forms_core::Property;

use super::WidgetBase;

/// A text label.
pub struct Label {
    base: WidgetBase,
    text: Property<String>,
}

impl Label {
    /// Create a label.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new(),
            text: Property::new(text.into()),
        }
    }

    /// Shared widget state.
    pub fn base(&self) -> &WidgetBase {
        &self.base
    }

    /// The text.
    pub fn text(&self) -> String {
        self.text.get()
    }

    /// Replace the text.
    pub fn set_text(&self, text: impl Into<String>) {
        self.text.set_silent(text.into());
    }
}

impl std::fmt::Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Label").field("text", &self.text()).finish()
    }
}
