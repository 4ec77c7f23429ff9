use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modal::{ModalConfig, acknowledge_button, danger_dialog};
use crate::payload::FormPayload;

pub const REQUIRED_FIELDS_SELECTOR: &str = ".required input, .required textarea, .required select";
pub const INVALID_CLASS: &str = "is-invalid";
pub const INVALID_SELECTOR: &str = ".is-invalid";
pub const REQUIRED_MESSAGE: &str = "Required";
pub const UNIQUE_DEFAULT_MESSAGE: &str = "Value must be unique";
pub const VALIDATE_ATTRIBUTE: &str = "data-validate";
pub const FIELD_CONTROL_SELECTOR: &str = ".form-control";
pub const FIELD_FEEDBACK_SELECTOR: &str = ".invalid-feedback";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredField {
    pub value: String,
}

impl RequiredField {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// A required field has no value.
    Incomplete,
    /// Some field was already flagged invalid by another check.
    Invalid,
}

impl ValidationFailure {
    pub fn title(self) -> &'static str {
        match self {
            Self::Incomplete => "Incomplete Data",
            Self::Invalid => "Invalid Data",
        }
    }

    pub fn description(self) -> Markup {
        match self {
            Self::Incomplete => html! {
                "Please add missing information to" br; " any "
                span class="text-danger" { "required" } " fields and try again."
            },
            Self::Invalid => html! {
                "Please correct any" br; " "
                span class="text-danger" { "error" } " fields and try again."
            },
        }
    }

    pub fn failure_modal(self) -> ModalConfig {
        let mut config = danger_dialog(
            html! { (self.title()) },
            Some(self.description()),
            vec![acknowledge_button(false)],
        );
        config.centered = true;
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Indexes into the required-field list that must be flagged.
    pub mark_invalid: Vec<usize>,
    pub failure: Option<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }
}

/// `previously_invalid` counts fields in scope already carrying the invalid
/// class before this pass.
pub fn validate_required(required: &[RequiredField], previously_invalid: usize) -> ValidationReport {
    let mark_invalid: Vec<usize> = required
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_empty())
        .map(|(index, _)| index)
        .collect();
    let failure = if !mark_invalid.is_empty() {
        Some(ValidationFailure::Incomplete)
    } else if previously_invalid > 0 {
        Some(ValidationFailure::Invalid)
    } else {
        None
    };
    ValidationReport {
        mark_invalid,
        failure,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldVerdict {
    Valid,
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueRule {
    pub collection: String,
    pub field: String,
    pub exempt_id: Option<String>,
    pub error_message: Option<String>,
}

impl UniqueRule {
    pub fn payload(&self, value: &str) -> FormPayload {
        let mut payload = FormPayload::new()
            .with("collection", self.collection.as_str())
            .with("field", self.field.as_str())
            .with("value", value);
        if let Some(exempt_id) = self.exempt_id.as_deref().filter(|id| !id.is_empty()) {
            payload.insert("exempt_id", exempt_id);
        }
        payload
    }

    pub fn verdict(&self, response: &Value) -> FieldVerdict {
        if is_truthy(response.get("error")) {
            FieldVerdict::Invalid(
                self.error_message
                    .clone()
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| UNIQUE_DEFAULT_MESSAGE.to_string()),
            )
        } else {
            FieldVerdict::Valid
        }
    }
}

/// Per-input rule, checked when a single field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputRule {
    /// `data-validate` name of the field group to annotate.
    pub input: String,
    pub required: bool,
    pub unique: Option<UniqueRule>,
    /// Form whose submit guard is held while the check runs.
    pub form: Option<String>,
}

pub fn required_verdict(value: &str) -> FieldVerdict {
    if value.is_empty() {
        FieldVerdict::Invalid(REQUIRED_MESSAGE.to_string())
    } else {
        FieldVerdict::Valid
    }
}

pub fn field_group_selector(name: &str, inner: &str) -> String {
    format!(
        "{} {inner}",
        crate::selector::attribute_selector(VALIDATE_ATTRIBUTE, name)
    )
}

pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}
