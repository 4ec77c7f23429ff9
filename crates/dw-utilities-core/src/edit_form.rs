//! Record-editing page controller: save/delete requests and the inline delete
//! confirmation, modelled as an explicit state machine whose markup is a pure
//! function of its phase.

use maud::{Markup, PreEscaped, html};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::payload::{FormPayload, PayloadError};
use crate::request::ApiRequest;

pub const ACTION_ATTRIBUTE: &str = "data-dw-action";
pub const FORM_KEY_ATTRIBUTE: &str = "data-dw-form";
pub const DEFAULT_DELETE_PROMPT: &str = "Are you sure?";

#[derive(Debug, Error)]
pub enum EditRequestError {
    #[error("invalid edit request: {source}")]
    Invalid { source: serde_json::Error },
    #[error("edit request has no url")]
    MissingUrl,
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Scope of one `edit_form()` instance. Both selectors fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditFormOptions {
    pub form: Option<String>,
    pub container: Option<String>,
}

impl EditFormOptions {
    pub fn form_selector(&self, config: &Config) -> String {
        non_blank(self.form.as_deref()).unwrap_or(&config.append_form_selector).to_string()
    }

    pub fn container_selector(&self, config: &Config) -> String {
        non_blank(self.container.as_deref())
            .unwrap_or(&config.delete_container_selector)
            .to_string()
    }
}

/// The data half of a save/delete call; the callback stays on the browser side.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditRequest {
    pub url: String,
    pub data: Value,
    pub redirect: Option<String>,
    pub debug: bool,
    pub message: Option<String>,
}

impl EditRequest {
    pub fn from_json(value: Value) -> Result<Self, EditRequestError> {
        serde_json::from_value(value).map_err(|source| EditRequestError::Invalid { source })
    }

    pub fn api_request(&self) -> Result<ApiRequest, EditRequestError> {
        if self.url.trim().is_empty() {
            return Err(EditRequestError::MissingUrl);
        }
        let mut request = ApiRequest::new(self.url.clone(), FormPayload::from_json_object(&self.data)?);
        request.debug = self.debug;
        Ok(request)
    }

    pub fn route(&self, has_callback: bool) -> ResponseRoute {
        ResponseRoute::resolve(has_callback, self.redirect.as_deref(), self.debug)
    }

    pub fn prompt(&self) -> &str {
        non_blank(self.message.as_deref()).unwrap_or(DEFAULT_DELETE_PROMPT)
    }
}

/// Where a successful save/delete response goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseRoute {
    Callback,
    Redirect(String),
    Debug,
    Ignore,
}

impl ResponseRoute {
    pub fn resolve(has_callback: bool, redirect: Option<&str>, debug: bool) -> Self {
        if has_callback {
            Self::Callback
        } else if let Some(target) = non_blank(redirect) {
            Self::Redirect(target.to_string())
        } else if debug {
            Self::Debug
        } else {
            Self::Ignore
        }
    }

    /// A redirect keeps the page busy until the browser navigates away.
    pub fn keeps_busy(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePhase {
    #[default]
    Idle,
    Confirming,
    Executing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAction {
    Confirm,
    Execute,
    Cancel,
}

impl DeleteAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "delete-confirm",
            Self::Execute => "delete-execute",
            Self::Cancel => "delete-cancel",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "delete-confirm" => Some(Self::Confirm),
            "delete-execute" => Some(Self::Execute),
            "delete-cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a delete that is {from:?}")]
pub struct DeleteTransitionError {
    pub from: DeletePhase,
    pub action: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteWorkflow {
    phase: DeletePhase,
}

impl DeleteWorkflow {
    pub fn phase(&self) -> DeletePhase {
        self.phase
    }

    /// A finished delete may be started again; sessions outlive one record.
    pub fn confirm(&mut self) -> Result<(), DeleteTransitionError> {
        self.transition(
            "confirm",
            &[DeletePhase::Idle, DeletePhase::Failed, DeletePhase::Done],
            DeletePhase::Confirming,
        )
    }

    pub fn cancel(&mut self) -> Result<(), DeleteTransitionError> {
        self.transition("cancel", &[DeletePhase::Confirming], DeletePhase::Idle)
    }

    /// Direct execution without a prompt is allowed; only a delete already in
    /// flight refuses a second one.
    pub fn execute(&mut self) -> Result<(), DeleteTransitionError> {
        self.transition(
            "execute",
            &[
                DeletePhase::Idle,
                DeletePhase::Confirming,
                DeletePhase::Failed,
                DeletePhase::Done,
            ],
            DeletePhase::Executing,
        )
    }

    pub fn complete(&mut self) -> Result<(), DeleteTransitionError> {
        self.transition("complete", &[DeletePhase::Executing], DeletePhase::Done)
    }

    pub fn fail(&mut self) -> Result<(), DeleteTransitionError> {
        self.transition("fail", &[DeletePhase::Executing], DeletePhase::Failed)
    }

    fn transition(
        &mut self,
        action: &'static str,
        allowed: &[DeletePhase],
        next: DeletePhase,
    ) -> Result<(), DeleteTransitionError> {
        if !allowed.contains(&self.phase) {
            return Err(DeleteTransitionError {
                from: self.phase,
                action,
            });
        }
        self.phase = next;
        Ok(())
    }
}

/// Contents of the delete container for the workflow's current phase.
/// `prompt` is page-authored markup.
pub fn render_delete_container(workflow: &DeleteWorkflow, form_key: &str, prompt: &str) -> Markup {
    match workflow.phase() {
        DeletePhase::Idle | DeletePhase::Failed => html! {
            (action_button("btn btn-outline-danger", form_key, DeleteAction::Confirm, "Delete"))
        },
        DeletePhase::Confirming => html! {
            div class="mb-2 fw-medium" { (PreEscaped(prompt)) }
            (action_button("btn btn-danger", form_key, DeleteAction::Execute, "Yes"))
            (PreEscaped("&nbsp;"))
            (action_button("btn", form_key, DeleteAction::Cancel, "Cancel"))
        },
        DeletePhase::Executing => html! {
            button type="button" class="btn btn-danger" disabled { "Deleting\u{2026}" }
        },
        DeletePhase::Done => html! {},
    }
}

fn action_button(class: &str, form_key: &str, action: DeleteAction, label: &str) -> Markup {
    html! {
        button type="button" class=(class) data-dw-action=(action.as_str()) data-dw-form=(form_key) { (label) }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn callback_beats_redirect_beats_debug() {
        assert_eq!(ResponseRoute::resolve(true, Some("/next"), true), ResponseRoute::Callback);
        assert_eq!(
            ResponseRoute::resolve(false, Some("/next"), true),
            ResponseRoute::Redirect("/next".to_string())
        );
        assert_eq!(ResponseRoute::resolve(false, Some(" "), true), ResponseRoute::Debug);
        assert_eq!(ResponseRoute::resolve(false, None, false), ResponseRoute::Ignore);
    }

    #[test]
    fn only_redirect_keeps_the_page_busy() {
        assert!(ResponseRoute::Redirect("/".to_string()).keeps_busy());
        assert!(!ResponseRoute::Callback.keeps_busy());
        assert!(!ResponseRoute::Debug.keeps_busy());
        assert!(!ResponseRoute::Ignore.keeps_busy());
    }

    #[test]
    fn request_builds_form_payload() {
        let request = EditRequest::from_json(json!({
            "url": "/admin/pages/save",
            "data": {"id": 4, "title": "A & B"},
            "redirect": "/admin/pages"
        }))
        .expect("request");
        let api = request.api_request().expect("api request");
        assert_eq!(api.url, "/admin/pages/save");
        assert_eq!(api.body(), "id=4&title=A%20%26%20B");
        assert_eq!(request.route(false), ResponseRoute::Redirect("/admin/pages".to_string()));
    }

    #[test]
    fn request_without_url_is_rejected() {
        let request = EditRequest::from_json(json!({"data": {}})).expect("request");
        assert!(matches!(request.api_request(), Err(EditRequestError::MissingUrl)));
    }

    #[test]
    fn non_object_data_is_rejected() {
        let request = EditRequest::from_json(json!({"url": "/x", "data": [1, 2]})).expect("request");
        assert!(matches!(
            request.api_request(),
            Err(EditRequestError::Payload(PayloadError::NotAnObject))
        ));
    }

    #[test]
    fn prompt_falls_back_to_default() {
        let request = EditRequest::default();
        assert_eq!(request.prompt(), DEFAULT_DELETE_PROMPT);
        let custom = EditRequest {
            message: Some("Remove <b>page</b>?".to_string()),
            ..EditRequest::default()
        };
        assert_eq!(custom.prompt(), "Remove <b>page</b>?");
    }

    #[test]
    fn options_fall_back_to_config() {
        let config = Config::default();
        let options = EditFormOptions::default();
        assert_eq!(options.form_selector(&config), "form.edit-form");
        assert_eq!(options.container_selector(&config), r#"[data-container="delete"]"#);
        let scoped = EditFormOptions {
            form: Some("#profile".to_string()),
            container: Some("#profile-delete".to_string()),
        };
        assert_eq!(scoped.form_selector(&config), "#profile");
        assert_eq!(scoped.container_selector(&config), "#profile-delete");
    }

    #[test]
    fn delete_flow_walks_its_states() {
        let mut workflow = DeleteWorkflow::default();
        workflow.confirm().expect("confirm");
        assert_eq!(workflow.phase(), DeletePhase::Confirming);
        workflow.cancel().expect("cancel");
        assert_eq!(workflow.phase(), DeletePhase::Idle);
        workflow.confirm().expect("confirm again");
        workflow.execute().expect("execute");
        workflow.fail().expect("fail");
        assert_eq!(workflow.phase(), DeletePhase::Failed);
        workflow.execute().expect("retry");
        workflow.complete().expect("complete");
        assert_eq!(workflow.phase(), DeletePhase::Done);
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut workflow = DeleteWorkflow::default();
        let error = workflow.cancel().expect_err("cannot cancel idle");
        assert_eq!(error.from, DeletePhase::Idle);
        assert_eq!(workflow.phase(), DeletePhase::Idle);

        workflow.execute().expect("execute");
        assert!(workflow.confirm().is_err());
        assert!(workflow.execute().is_err());
        assert_eq!(workflow.phase(), DeletePhase::Executing);

        workflow.complete().expect("complete");
        assert!(workflow.cancel().is_err());
        assert!(workflow.fail().is_err());
        assert_eq!(workflow.phase(), DeletePhase::Done);
    }

    #[test]
    fn finished_delete_can_run_again() {
        let mut workflow = DeleteWorkflow::default();
        workflow.execute().expect("first delete");
        workflow.complete().expect("complete");
        workflow.execute().expect("second delete");
        assert_eq!(workflow.phase(), DeletePhase::Executing);
        let error = workflow.execute().expect_err("already in flight");
        assert_eq!(error.from, DeletePhase::Executing);
        assert_eq!(error.action, "execute");

        workflow.complete().expect("complete again");
        workflow.confirm().expect("prompt after done");
        assert_eq!(workflow.phase(), DeletePhase::Confirming);
    }

    #[test]
    fn container_markup_follows_phase() {
        let mut workflow = DeleteWorkflow::default();
        let idle = render_delete_container(&workflow, "form.edit-form", "Sure?").into_string();
        assert!(idle.contains(r#"data-dw-action="delete-confirm""#));
        assert!(idle.contains(">Delete</button>"));

        workflow.confirm().expect("confirm");
        let confirming = render_delete_container(&workflow, "form.edit-form", "Sure?").into_string();
        assert!(confirming.contains(r#"<div class="mb-2 fw-medium">Sure?</div>"#));
        assert!(confirming.contains(r#"data-dw-action="delete-execute""#));
        assert!(confirming.contains(r#"data-dw-action="delete-cancel""#));
        assert!(confirming.contains(r#"data-dw-form="form.edit-form""#));

        workflow.execute().expect("execute");
        let executing = render_delete_container(&workflow, "form.edit-form", "Sure?").into_string();
        assert!(executing.contains("disabled"));

        workflow.complete().expect("complete");
        assert!(render_delete_container(&workflow, "form.edit-form", "Sure?").into_string().is_empty());
    }

    #[test]
    fn delete_actions_round_trip_through_attributes() {
        for action in [DeleteAction::Confirm, DeleteAction::Execute, DeleteAction::Cancel] {
            assert_eq!(DeleteAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(DeleteAction::parse("delete"), None);
    }
}
