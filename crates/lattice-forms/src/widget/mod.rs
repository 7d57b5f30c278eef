//! Headless input widgets.
//!
//! Widgets here hold state (value, enabled, visible, tooltip, choices,
//! errors) and announce user edits through signals. They do not paint; a
//! host renders them however it likes and forwards user input through the
//! `user_*` methods.
//!
//! Two ways of changing a widget's value exist, and the difference matters
//! for the binder:
//!
//! - [`InputWidget::set_value`] is a programmatic, silent update. Nothing is
//!   emitted, so model-to-widget pushes never loop back into the model.
//! - [`InputWidget::user_edit`] (and the widget-specific `user_*` helpers)
//!   behave like the user typed: the value is stored and
//!   [`value_changed`](InputWidget::value_changed) is emitted.
//!
//! # Example
//!
//! ```
//! use lattice_forms::widget::{InputWidget, TextInput};
//! use lattice_forms_core::Value;
//!
//! let input = TextInput::new();
//! input.value_changed().connect(|value| println!("edited: {value}"));
//!
//! input.set_value(Value::from("loaded"));   // silent
//! input.user_input("typed");                // emits
//! assert_eq!(input.value(), Value::from("typed"));
//! ```

mod base;
mod check_box;
mod combo_box;
mod date_input;
mod error_indicator;
mod label;
mod number_input;
mod text_input;

use std::any::Any;
use std::fmt;

use lattice_forms_core::{Signal, Value};

pub use base::WidgetBase;
pub use check_box::CheckBox;
pub use combo_box::ComboBox;
pub use date_input::DateInput;
pub use error_indicator::ErrorIndicator;
pub use label::Label;
pub use number_input::NumberInput;
pub use text_input::{EchoMode, TextInput};

/// The concrete type behind an [`InputWidget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// [`TextInput`].
    TextInput,
    /// [`CheckBox`].
    CheckBox,
    /// [`NumberInput`].
    NumberInput,
    /// [`DateInput`].
    DateInput,
    /// [`ComboBox`].
    ComboBox,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::CheckBox => "CheckBox",
            Self::NumberInput => "NumberInput",
            Self::DateInput => "DateInput",
            Self::ComboBox => "ComboBox",
        };
        f.write_str(name)
    }
}

/// A widget editing a single [`Value`].
///
/// # Thread Safety
///
/// Widgets must be `Send + Sync` so handlers can hold them across the UI
/// queue; state changes are still expected on the UI thread.
pub trait InputWidget: Any + Send + Sync {
    /// The concrete widget type.
    fn kind(&self) -> WidgetKind;

    /// Shared widget state.
    fn base(&self) -> &WidgetBase;

    /// The current value.
    fn value(&self) -> Value;

    /// Replace the value without emitting [`value_changed`](Self::value_changed).
    fn set_value(&self, value: Value);

    /// Emitted when the user changes the value.
    fn value_changed(&self) -> &Signal<Value>;

    /// Upcast for downcasting to the concrete widget.
    fn as_any(&self) -> &dyn Any;

    /// Apply a value as if the user entered it.
    ///
    /// Returns `false` (and emits nothing) when the value is unchanged.
    fn user_edit(&self, value: Value) -> bool {
        if self.value() == value {
            return false;
        }
        self.set_value(value);
        self.value_changed().emit(self.value());
        true
    }
}

impl dyn InputWidget {
    /// Downcast to a concrete widget type.
    pub fn downcast_ref<T: InputWidget>(&self) -> Option<&T> {
        InputWidget::as_any(self).downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn InputWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputWidget")
            .field("kind", &self.kind())
            .field("value", &self.value())
            .field("enabled", &self.base().is_enabled())
            .field("visible", &self.base().is_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static_assertions::assert_impl_all!(TextInput: Send, Sync);
    static_assertions::assert_impl_all!(CheckBox: Send, Sync);
    static_assertions::assert_impl_all!(NumberInput: Send, Sync);
    static_assertions::assert_impl_all!(DateInput: Send, Sync);
    static_assertions::assert_impl_all!(ComboBox: Send, Sync);
    static_assertions::assert_impl_all!(ErrorIndicator: Send, Sync);

    #[test]
    fn test_set_value_is_silent() {
        let input = TextInput::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        input.value_changed().connect(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        input.set_value(Value::from("a"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(input.user_edit(Value::from("b")));
        assert!(!input.user_edit(Value::from("b")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_downcast() {
        let widget: Arc<dyn InputWidget> = Arc::new(CheckBox::new());
        assert_eq!(widget.kind(), WidgetKind::CheckBox);
        assert!(widget.downcast_ref::<CheckBox>().is_some());
        assert!(widget.downcast_ref::<TextInput>().is_none());
    }
}
