#![allow(clippy::expect_used)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use dw_utilities_core::config::Config;
use dw_utilities_core::cookie::{CookieJar, CookieStore};
use dw_utilities_core::edit_form::{DeletePhase, DeleteWorkflow, EditRequest, ResponseRoute};
use dw_utilities_core::form::{FieldKind, FieldSnapshot, serialize_fields};
use dw_utilities_core::modal::{ButtonRegistry, ModalButton, ModalConfig, group_id, render_modal};
use dw_utilities_core::payload::decode_form_body;
use dw_utilities_core::request::{RequestError, classify_response};
use dw_utilities_core::token::decode_token_payload_unverified;
use dw_utilities_core::upload::{
    DELETE_SENTINEL, UploadConfig, UploadEffect, UploadEvent, UploadResponse, UploadWorkflow, hidden_field_name,
};
use dw_utilities_core::validation::{RequiredField, validate_required};
use serde_json::json;

/// Rendered modal groups by wrapper id, standing in for `<body>`.
#[derive(Default)]
struct Body {
    groups: BTreeMap<String, String>,
}

impl Body {
    fn show(&mut self, registry: &mut ButtonRegistry<&'static str>, config: &ModalConfig, handlers: &[&'static str]) {
        let modal_id = config.explicit_id().unwrap_or("modal00000").to_string();
        let callbacks = config.callback_indexes().into_iter().zip(handlers.iter().copied());
        registry.register(&modal_id, callbacks);
        self.groups
            .insert(group_id(&modal_id), render_modal(config, &modal_id).into_string());
    }
}

/// Hidden inputs of the target form.
#[derive(Default)]
struct HiddenFields {
    fields: BTreeMap<String, String>,
}

impl HiddenFields {
    fn apply(&mut self, widget: &UploadWorkflow, effects: &[UploadEffect]) {
        let name = hidden_field_name(widget.id());
        for effect in effects {
            match effect {
                UploadEffect::SetHiddenField { value } => {
                    self.fields.insert(name.clone(), value.clone());
                }
                UploadEffect::RemoveHiddenField => {
                    self.fields.remove(&name);
                }
                _ => {}
            }
        }
    }
}

#[derive(Default)]
struct DocumentCookies {
    jar: RefCell<BTreeMap<String, String>>,
}

impl CookieStore for DocumentCookies {
    type Error = String;

    fn read_all(&self) -> Result<String, String> {
        Ok(self
            .jar
            .borrow()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "))
    }

    fn write(&self, assignment: &str) -> Result<(), String> {
        let (pair, attributes) = assignment.split_once(';').unwrap_or((assignment, ""));
        let (name, value) = pair.split_once('=').ok_or("missing '='")?;
        if attributes.contains("Max-Age=0") {
            self.jar.borrow_mut().remove(name);
        } else {
            self.jar.borrow_mut().insert(name.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[test]
fn saved_record_body_decodes_back_to_its_data() {
    let request = EditRequest::from_json(json!({
        "url": "/admin/pages/save",
        "data": {"title": "Spring sale", "slug": "spring-sale", "body": "50% off!"}
    }))
    .expect("request");
    let body = request.api_request().expect("api request").body();
    let decoded = decode_form_body(&body).expect("decoded body");
    assert_eq!(
        decoded,
        vec![
            ("title".to_string(), "Spring sale".to_string()),
            ("slug".to_string(), "spring-sale".to_string()),
            ("body".to_string(), "50% off!".to_string()),
        ]
    );
}

#[test]
fn serialization_is_idempotent_and_respects_checked_state() {
    let fields = vec![
        FieldSnapshot::value("title", "Hi"),
        FieldSnapshot::checkable("agree", FieldKind::Checkbox, "yes", false),
        FieldSnapshot::checkable("plan", FieldKind::Radio, "pro", true),
        FieldSnapshot::multi_select("tags", &[]),
        FieldSnapshot::multi_select("days", &["mon", "fri"]),
    ];
    let first = serialize_fields(&fields);
    assert_eq!(first, serialize_fields(&fields));
    assert_eq!(first, "title=Hi&plan=pro&days=mon&days=fri");
}

#[test]
fn validation_then_save_routes_response() {
    let report = validate_required(&[RequiredField::new("Ann"), RequiredField::new("ann@example.com")], 0);
    assert!(report.is_valid());
    assert!(report.mark_invalid.is_empty());

    let request = EditRequest::from_json(json!({"url": "/save", "redirect": "/done", "debug": true}))
        .expect("request");
    let response = classify_response(200, r#"{"id": 9}"#).expect("success");
    assert_eq!(response["id"], 9);
    assert_eq!(request.route(false), ResponseRoute::Redirect("/done".to_string()));
}

#[test]
fn server_error_produces_alert_text() {
    let error = classify_response(500, r#"{"error_code": "E42", "error_message": "Locked"}"#)
        .expect_err("server error");
    assert!(matches!(error, RequestError::Http(_)));
    let failure = error.failure().cloned().expect("http failure");
    assert_eq!(failure.alert_text(), "Server Error (E42) - Locked\nSee console for more details.");
}

#[test]
fn cookie_round_trip_through_store() {
    let jar = CookieJar::new(DocumentCookies::default());
    jar.set("a", "b", Config::default().cookie_days, 1_700_000_000_000)
        .expect("set");
    assert_eq!(jar.get("a").expect("get"), Some("b".to_string()));
    jar.delete("a").expect("delete");
    assert_eq!(jar.get("a").expect("get"), None);
}

#[test]
fn token_claims_decode_without_verification() {
    let claims = decode_token_payload_unverified("eyJhbGciOiJub25lIn0.eyJzdWIiOiIxMjMifQ.").expect("claims");
    assert_eq!(claims, json!({"sub": "123"}));
}

#[test]
fn rerendering_a_modal_id_replaces_markup_and_callbacks() {
    let mut body = Body::default();
    let mut registry = ButtonRegistry::default();

    let first = ModalConfig {
        modal_id: Some("confirm".to_string()),
        content: Some("First dialog".to_string()),
        buttons: vec![
            ModalButton::new("Keep").with_callback(),
            ModalButton::new("Drop").with_callback(),
        ],
        ..ModalConfig::default()
    };
    let second = ModalConfig {
        modal_id: Some("confirm".to_string()),
        content: Some("Second dialog".to_string()),
        buttons: vec![ModalButton::new("Close").closes(), ModalButton::new("Go").with_callback()],
        ..ModalConfig::default()
    };
    let other = ModalConfig {
        modal_id: Some("other".to_string()),
        buttons: vec![ModalButton::new("OK").with_callback()],
        ..ModalConfig::default()
    };

    body.show(&mut registry, &first, &["keep", "drop"]);
    body.show(&mut registry, &other, &["other-ok"]);
    body.show(&mut registry, &second, &["go"]);

    let groups: Vec<_> = body.groups.keys().cloned().collect();
    assert_eq!(groups, vec!["confirm-group".to_string(), "other-group".to_string()]);
    let markup = &body.groups["confirm-group"];
    assert!(markup.contains("Second dialog"));
    assert!(!markup.contains("First dialog"));

    assert_eq!(registry.get("confirm", 0), None);
    assert_eq!(registry.get("confirm", 1), Some(&"go"));
    assert_eq!(registry.get("other", 0), Some(&"other-ok"));
}

#[test]
fn upload_delete_reset_removes_field_and_deferred_writes_sentinel() {
    let config = Config::default();
    let response = UploadResponse::from_value(&json!({"filename": "f1.png", "preview_url": "/p/f1.png"}));

    let mut reset = UploadWorkflow::new("cover", &UploadConfig::default(), &config);
    let mut form = HiddenFields::default();
    let effects = reset.apply(UploadEvent::Success(response.clone()));
    form.apply(&reset, &effects);
    assert_eq!(form.fields.get("upload_cover").map(String::as_str), Some("f1.png"));
    let effects = reset.apply(UploadEvent::Delete { reset: true });
    form.apply(&reset, &effects);
    assert!(!form.fields.contains_key("upload_cover"));

    let mut deferred = UploadWorkflow::new("cover", &UploadConfig::default(), &config);
    let mut form = HiddenFields::default();
    let effects = deferred.apply(UploadEvent::Delete { reset: false });
    form.apply(&deferred, &effects);
    assert_eq!(form.fields.get("upload_cover").map(String::as_str), Some(DELETE_SENTINEL));
}

#[test]
fn delete_flow_confirm_execute_complete() {
    let mut workflow = DeleteWorkflow::default();
    workflow.confirm().expect("confirm");
    workflow.execute().expect("execute");
    workflow.complete().expect("complete");
    assert_eq!(workflow.phase(), DeletePhase::Done);
}
