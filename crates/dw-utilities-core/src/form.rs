//! Form serialization over snapshots of a form's controls.
//!
//! The browser layer reads `form.elements` into [`FieldSnapshot`]s in document
//! order; everything after that is plain data.

use crate::payload::encode_pair;

/// Class marking a rich-text editor region mirrored into a hidden input.
pub const RICH_TEXT_EDITOR_SELECTOR: &str = ".quill-editor";
/// Rendered content node inside a rich-text editor region.
pub const RICH_TEXT_CONTENT_SELECTOR: &str = ".ql-editor";
/// Attribute naming the hidden input that mirrors an editor region.
pub const RICH_TEXT_TARGET_ATTRIBUTE: &str = "data-target";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Checkbox,
    Radio,
    SelectMultiple,
    File,
    Reset,
    Submit,
    Button,
    /// Text-like inputs, textareas, single selects and anything unrecognised.
    Value,
}

impl FieldKind {
    pub fn from_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "select-multiple" | "select" => Self::SelectMultiple,
            "file" => Self::File,
            "reset" => Self::Reset,
            "submit" => Self::Submit,
            "button" => Self::Button,
            _ => Self::Value,
        }
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::File | Self::Reset | Self::Submit | Self::Button)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub name: String,
    pub kind: FieldKind,
    pub disabled: bool,
    pub checked: bool,
    pub value: String,
    pub selected_values: Vec<String>,
}

impl FieldSnapshot {
    pub fn value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Value,
            disabled: false,
            checked: false,
            value: value.to_string(),
            selected_values: Vec::new(),
        }
    }

    pub fn checkable(name: &str, kind: FieldKind, value: &str, checked: bool) -> Self {
        Self {
            checked,
            kind,
            ..Self::value(name, value)
        }
    }

    pub fn multi_select(name: &str, selected: &[&str]) -> Self {
        Self {
            kind: FieldKind::SelectMultiple,
            selected_values: selected.iter().map(ToString::to_string).collect(),
            ..Self::value(name, "")
        }
    }

    /// Encoded `name=value` pairs this control contributes.
    pub fn pairs(&self) -> Vec<String> {
        if self.name.is_empty() || self.disabled || self.kind.is_excluded() {
            return Vec::new();
        }
        match self.kind {
            FieldKind::SelectMultiple => self
                .selected_values
                .iter()
                .map(|value| encode_pair(&self.name, value))
                .collect(),
            FieldKind::Checkbox | FieldKind::Radio if !self.checked => Vec::new(),
            _ => vec![encode_pair(&self.name, &self.value)],
        }
    }
}

pub fn serialize_fields(fields: &[FieldSnapshot]) -> String {
    fields
        .iter()
        .flat_map(FieldSnapshot::pairs)
        .collect::<Vec<_>>()
        .join("&")
}
