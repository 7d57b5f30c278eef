//! Single-line, multi-line and password text entry.

use std::any::Any;

use lattice_forms_core::{Property, Signal, Value, ValueKind};

use super::{InputWidget, WidgetBase, WidgetKind};

/// How typed characters are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EchoMode {
    /// Characters are shown as typed.
    #[default]
    Normal,
    /// Characters are masked.
    Password,
}

/// A text entry widget.
///
/// A `TextInput` can also edit non-text values: with a target kind other
/// than [`ValueKind::Text`] the text is parsed on read, and blank text reads
/// as [`Value::Null`]. Text that does not parse is reported as
/// [`Value::Text`], which a typed property then rejects.
pub struct TextInput {
    base: WidgetBase,
    text: Property<String>,
    multiline: bool,
    echo_mode: EchoMode,
    target_kind: ValueKind,

    /// Emitted when the user edits the text.
    pub value_changed: Signal<Value>,
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl TextInput {
    /// Create a single-line text input.
    pub fn new() -> Self {
        Self {
            base: WidgetBase::new(),
            text: Property::new(String::new()),
            multiline: false,
            echo_mode: EchoMode::Normal,
            target_kind: ValueKind::Text,
            value_changed: Signal::new(),
        }
    }

    /// Create a multi-line text input.
    pub fn multiline() -> Self {
        Self {
            multiline: true,
            ..Self::new()
        }
    }

    /// Create a masked single-line input.
    pub fn password() -> Self {
        Self {
            echo_mode: EchoMode::Password,
            ..Self::new()
        }
    }

    /// Set the kind of value the text is converted to.
    pub fn with_target_kind(mut self, kind: ValueKind) -> Self {
        self.target_kind = kind;
        self
    }

    /// The raw text.
    pub fn text(&self) -> String {
        self.text.get()
    }

    /// The text as it should be rendered.
    pub fn display_text(&self) -> String {
        match self.echo_mode {
            EchoMode::Normal => self.text.get(),
            EchoMode::Password => self.text.with(|t| "\u{2022}".repeat(t.chars().count())),
        }
    }

    /// Whether line breaks are allowed.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// The echo mode.
    pub fn echo_mode(&self) -> EchoMode {
        self.echo_mode
    }

    /// The kind of value the text converts to.
    pub fn target_kind(&self) -> ValueKind {
        self.target_kind
    }

    /// Replace the text as if the user typed it.
    pub fn user_input(&self, text: &str) -> bool {
        let text = if self.multiline {
            text.to_string()
        } else {
            text.replace(['\r', '\n'], " ")
        };
        if !self.text.set(text) {
            return false;
        }
        self.value_changed.emit(self.value());
        true
    }
}

impl InputWidget for TextInput {
    fn kind(&self) -> WidgetKind {
        WidgetKind::TextInput
    }

    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn value(&self) -> Value {
        let text = self.text.get();
        if self.target_kind == ValueKind::Text {
            return Value::Text(text);
        }
        Value::parse_as(self.target_kind, &text).unwrap_or(Value::Text(text))
    }

    fn set_value(&self, value: Value) {
        self.text.set_silent(value.to_string());
    }

    fn value_changed(&self) -> &Signal<Value> {
        &self.value_changed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
