//! The grid item of one bound property.

use std::fmt;
use std::sync::Arc;

use lattice_forms_core::{ColumnSpan, Metadata};

use crate::factory::ControlContext;
use crate::widget::{ErrorIndicator, InputWidget, Label};

/// A property's input control, label, optional error indicator and span.
///
/// Items are owned by the bound form and shared with the watch handlers
/// bound to their property.
pub struct PropertyGridItem {
    control: ControlContext,
    label: Label,
    error_indicator: Option<ErrorIndicator>,
    column_span: ColumnSpan,
}

impl PropertyGridItem {
    /// Create an item without an error indicator.
    pub fn new(control: ControlContext, label: impl Into<String>, column_span: ColumnSpan) -> Self {
        Self {
            control,
            label: Label::new(label),
            error_indicator: None,
            column_span,
        }
    }

    /// Attach an error indicator.
    pub fn with_error_indicator(mut self) -> Self {
        self.error_indicator = Some(ErrorIndicator::new());
        self
    }

    /// The bound property.
    pub fn property(&self) -> &Arc<Metadata> {
        self.control.property()
    }

    /// The input control.
    pub fn control(&self) -> &ControlContext {
        &self.control
    }

    /// The input widget.
    pub fn widget(&self) -> &Arc<dyn InputWidget> {
        self.control.widget()
    }

    /// The label.
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// The error indicator, present when the property is validated.
    pub fn error_indicator(&self) -> Option<&ErrorIndicator> {
        self.error_indicator.as_ref()
    }

    /// Current validation messages.
    pub fn errors(&self) -> Vec<String> {
        self.error_indicator
            .as_ref()
            .map(ErrorIndicator::errors)
            .unwrap_or_default()
    }

    /// The resolved column span.
    pub fn column_span(&self) -> ColumnSpan {
        self.column_span
    }

    /// Whether the input is currently shown.
    pub fn is_visible(&self) -> bool {
        self.widget().base().is_visible()
    }

    /// Show or hide the input and its label together.
    pub fn set_visible(&self, visible: bool) {
        self.widget().base().set_visible(visible);
        self.label.base().set_visible(visible);
    }
}

impl fmt::Debug for PropertyGridItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyGridItem")
            .field("property", &self.property().name())
            .field("label", &self.label.text())
            .field("widget", &self.widget().kind())
            .field("column_span", &self.column_span)
            .finish()
    }
}
