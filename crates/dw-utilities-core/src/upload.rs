//! Upload widget wiring.
//!
//! The browser layer binds a Dropzone instance per widget id and forwards its
//! lifecycle callbacks here as [`UploadEvent`]s. [`UploadWorkflow::apply`]
//! answers with the DOM effects to perform, in order.

use maud::{Markup, PreEscaped, html};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;
use crate::modal::{ModalButton, ModalConfig, class_list, danger_dialog};
use crate::selector::attribute_selector;
use crate::validation::is_truthy;

pub const UPLOAD_ATTRIBUTE: &str = "data-dz-upload";
pub const UPLOAD_DELETE_ATTRIBUTE: &str = "data-dw-upload-delete";
pub const HIDDEN_FIELD_PREFIX: &str = "upload_";
/// Hidden-field value telling the backend to drop the stored file on save.
pub const DELETE_SENTINEL: &str = "DELETE";

pub const DROP_TARGET_SELECTOR: &str = ".dropzone";
pub const EMPTY_PROMPT_SELECTOR: &str = ".dz-message";
pub const PREVIEW_SELECTOR: &str = ".preview-image";
pub const PREVIEW_IMAGE_SELECTOR: &str = ".preview-image img";
pub const NEW_UPLOAD_SELECTOR: &str = ".new-upload";
pub const ERROR_CLASS: &str = "error";

pub const UPLOAD_ERROR_TITLE: &str = "Upload Error";
pub const DEFAULT_DELETE_MESSAGE: &str = "Are you sure you want<br /> to remove this photo?";
pub const DEFAULT_PREVIEW_TEMPLATE: &str = r#"<div class="dz-preview dz-file-preview"><img data-dz-thumbnail /><div class="dz-progress-container"><div class="dz-progress"><span class="dz-upload" data-dz-uploadprogress></span></div></div></div>"#;

const DELETE_ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" fill="currentColor" class="text-danger bi bi-x-circle-fill" viewBox="0 0 16 16"><path d="M16 8A8 8 0 1 1 0 8a8 8 0 0 1 16 0zM5.354 4.646a.5.5 0 1 0-.708.708L7.293 8l-2.647 2.646a.5.5 0 0 0 .708.708L8 8.707l2.646 2.647a.5.5 0 0 0 .708-.708L8.707 8l2.647-2.646a.5.5 0 0 0-.708-.708L8 7.293 5.354 4.646z"/></svg>"#;

#[derive(Debug, Error)]
pub enum UploadConfigError {
    #[error("invalid upload options: {source}")]
    Invalid { source: serde_json::Error },
    #[error("upload response is not valid json: {source}")]
    Response { source: serde_json::Error },
}

pub fn hidden_field_name(id: &str) -> String {
    format!("{HIDDEN_FIELD_PREFIX}{id}")
}

/// `[data-dz-upload="<id>"] <inner>`, or just the widget root when `inner` is
/// empty.
pub fn widget_selector(id: &str, inner: &str) -> String {
    let root = attribute_selector(UPLOAD_ATTRIBUTE, id);
    if inner.is_empty() { root } else { format!("{root} {inner}") }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub append_form: Option<String>,
    pub preview_html: Option<String>,
    pub preview_class_extra: Option<String>,
    pub dz_options: Map<String, Value>,
}

impl UploadConfig {
    pub fn from_json(value: Value) -> Result<Self, UploadConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|source| UploadConfigError::Invalid { source })
    }

    pub fn append_form_or(&self, config: &Config) -> String {
        non_blank(self.append_form.as_deref())
            .unwrap_or(&config.append_form_selector)
            .to_string()
    }
}

/// Widget options with defaults filled in only where the caller left a key out.
pub fn merge_dropzone_options(id: &str, mut options: Map<String, Value>, config: &Config) -> Map<String, Value> {
    let defaults = [
        ("acceptedFiles", Value::from(config.accepted_files.as_str())),
        ("maxFilesize", Value::from(config.max_filesize_mb)),
        ("url", Value::from(config.upload_url.as_str())),
        ("clickable", Value::from(widget_selector(id, DROP_TARGET_SELECTOR))),
        ("previewTemplate", Value::from(DEFAULT_PREVIEW_TEMPLATE)),
    ];
    for (key, value) in defaults {
        options.entry(key).or_insert(value);
    }
    options
}

/// Parsed body of the upload endpoint's reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResponse {
    pub error: bool,
    pub error_title: Option<String>,
    pub error_message: Option<String>,
    pub filename: String,
    pub preview_url: String,
}

impl UploadResponse {
    pub fn parse(body: &str) -> Result<Self, UploadConfigError> {
        let value: Value =
            serde_json::from_str(body).map_err(|source| UploadConfigError::Response { source })?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        Self {
            error: is_truthy(value.get("error")),
            error_title: text(value.get("error_title")),
            error_message: text(value.get("error_message")),
            filename: text(value.get("filename")).unwrap_or_default(),
            preview_url: text(value.get("preview_url")).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhase {
    Empty,
    Queued,
    Transferring,
    Processing,
    Previewing { filename: String },
    Failed,
    MarkedForDeletion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Thumbnail,
    Progress(f64),
    Error(String),
    Success(UploadResponse),
    PreviewLoaded,
    ErrorAcknowledged,
    Delete { reset: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEffect {
    HideEmptyPrompt,
    ShowEmptyPrompt,
    HideDropTarget,
    ShowDropTarget,
    MarkBusy,
    ReleaseBusy,
    /// Plain text; escaped when rendered.
    ShowError { title: String, message: String },
    ClearWidget,
    RenderPreview { html: String },
    AwaitPreviewLoad,
    ShowPreviewImage,
    ClearPreview,
    SetHiddenField { value: String },
    RemoveHiddenField,
    NotifyDelete { filename: String },
    ClearErrorClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadWorkflow {
    id: String,
    append_form: String,
    preview_html: Option<String>,
    preview_class_extra: Option<String>,
    phase: UploadPhase,
}

impl UploadWorkflow {
    pub fn new(id: &str, upload: &UploadConfig, config: &Config) -> Self {
        Self {
            id: id.to_string(),
            append_form: upload.append_form_or(config),
            preview_html: non_blank(upload.preview_html.as_deref()).map(ToString::to_string),
            preview_class_extra: upload.preview_class_extra.clone(),
            phase: UploadPhase::Empty,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append_form(&self) -> &str {
        &self.append_form
    }

    pub fn phase(&self) -> &UploadPhase {
        &self.phase
    }

    /// Busy-tracker holder key for this widget.
    pub fn busy_holder(&self) -> String {
        format!("upload:{}", self.id)
    }

    pub fn apply(&mut self, event: UploadEvent) -> Vec<UploadEffect> {
        use UploadEffect as E;

        match event {
            UploadEvent::Thumbnail => {
                self.phase = UploadPhase::Queued;
                vec![E::HideEmptyPrompt]
            }
            UploadEvent::Progress(percent) if percent >= 100.0 => {
                self.phase = UploadPhase::Processing;
                vec![E::HideDropTarget, E::MarkBusy]
            }
            UploadEvent::Progress(_) => {
                self.phase = UploadPhase::Transferring;
                Vec::new()
            }
            UploadEvent::Error(message) => {
                self.phase = UploadPhase::Failed;
                vec![
                    E::ReleaseBusy,
                    E::ShowError {
                        title: UPLOAD_ERROR_TITLE.to_string(),
                        message,
                    },
                ]
            }
            UploadEvent::Success(response) if response.error => {
                self.phase = UploadPhase::Failed;
                vec![
                    E::ReleaseBusy,
                    E::ShowError {
                        title: response
                            .error_title
                            .unwrap_or_else(|| UPLOAD_ERROR_TITLE.to_string()),
                        message: response.error_message.unwrap_or_default(),
                    },
                ]
            }
            UploadEvent::Success(response) => {
                let mut effects = match self.preview_html.clone() {
                    Some(html) => vec![E::RenderPreview { html }, E::HideDropTarget, E::ReleaseBusy],
                    None => vec![
                        E::RenderPreview {
                            html: render_preview(&self.id, &response, self.preview_class_extra.as_deref())
                                .into_string(),
                        },
                        E::AwaitPreviewLoad,
                    ],
                };
                effects.push(E::ClearErrorClass);
                effects.push(E::SetHiddenField {
                    value: response.filename.clone(),
                });
                self.phase = UploadPhase::Previewing {
                    filename: response.filename,
                };
                effects
            }
            UploadEvent::PreviewLoaded => match self.phase {
                UploadPhase::Previewing { .. } => vec![E::HideDropTarget, E::ShowPreviewImage, E::ReleaseBusy],
                _ => Vec::new(),
            },
            UploadEvent::ErrorAcknowledged => match self.phase {
                UploadPhase::Failed => {
                    self.phase = UploadPhase::Empty;
                    vec![E::ClearWidget, E::ShowEmptyPrompt]
                }
                _ => Vec::new(),
            },
            UploadEvent::Delete { reset: true } => {
                let uploaded = match std::mem::replace(&mut self.phase, UploadPhase::Empty) {
                    UploadPhase::Previewing { filename } if !filename.is_empty() => Some(filename),
                    _ => None,
                };
                let mut effects = vec![
                    E::ClearWidget,
                    E::ShowEmptyPrompt,
                    E::ShowDropTarget,
                    E::ClearPreview,
                    E::RemoveHiddenField,
                ];
                if let Some(filename) = uploaded {
                    effects.push(E::NotifyDelete { filename });
                }
                effects
            }
            UploadEvent::Delete { reset: false } => {
                self.phase = UploadPhase::MarkedForDeletion;
                vec![
                    E::ClearPreview,
                    E::ShowDropTarget,
                    E::SetHiddenField {
                        value: DELETE_SENTINEL.to_string(),
                    },
                ]
            }
        }
    }
}

/// Freshly uploaded image plus its delete affordance. Server-supplied values
/// are escaped.
pub fn render_preview(id: &str, response: &UploadResponse, class_extra: Option<&str>) -> Markup {
    html! {
        img class=(class_list(&["new-upload", class_extra.unwrap_or_default()])) src=(response.preview_url);
        div class="upload-delete position-absolute top-0 end-0" data-new="true" data-filename=(response.filename) data-id=(id) {
            span class="d-block cursor-pointer p-3" data-dw-upload-delete=(id) {
                (PreEscaped(DELETE_ICON_SVG))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadDeleteOptions {
    pub confirm: bool,
    /// Clear the widget and delete the stored file now instead of marking the
    /// field for deletion on the next save.
    pub reset: bool,
    pub append_form: Option<String>,
    pub message: Option<String>,
}

impl UploadDeleteOptions {
    pub fn from_json(value: Value) -> Result<Self, UploadConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|source| UploadConfigError::Invalid { source })
    }

    pub fn message_or_default(&self) -> &str {
        non_blank(self.message.as_deref()).unwrap_or(DEFAULT_DELETE_MESSAGE)
    }
}

/// Yes/No prompt; only Yes carries a callback. `message` is page-authored
/// markup.
pub fn confirm_delete_modal(message: &str) -> ModalConfig {
    let mut config = danger_dialog(
        html! { (PreEscaped(message)) },
        None,
        vec![
            ModalButton::new("Yes")
                .color("danger")
                .class_extra("mb-3 px-3")
                .closes()
                .with_callback(),
            ModalButton::new("No").class_extra("mb-3 px-3").closes(),
        ],
    );
    config.modal_title_extra = Some("text-center w-100 pt-2 fs-2 mb-0".to_string());
    config.modal_footer_extra = Some("border-top-0 bg-transparent justify-content-center".to_string());
    config
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
