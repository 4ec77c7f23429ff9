use serde_json::Value;
use thiserror::Error;

use crate::payload::FormPayload;

/// Highest status treated as a successful response.
pub const SUCCESS_STATUS_MAX: u16 = 399;

const ALERT_PREFIX: &str = "Server Error";
const ALERT_SUFFIX: &str = "\nSee console for more details.";

/// One form-encoded POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub payload: FormPayload,
    pub debug: bool,
}

impl ApiRequest {
    pub fn new(url: impl Into<String>, payload: FormPayload) -> Self {
        Self {
            url: url.into(),
            payload,
            debug: false,
        }
    }

    pub fn body(&self) -> String {
        self.payload.encode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFailure {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub body_parsed: bool,
}

impl RequestFailure {
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(parsed @ Value::Object(_)) => Self {
                status,
                code: parsed.get("error_code").and_then(display_text),
                message: parsed.get("error_message").and_then(display_text),
                body_parsed: true,
            },
            _ => Self {
                status,
                code: None,
                message: None,
                body_parsed: false,
            },
        }
    }

    pub fn summary(&self) -> String {
        let mut summary = ALERT_PREFIX.to_string();
        if !self.body_parsed {
            summary.push_str(&format!(" ({})", self.status));
            return summary;
        }
        if let Some(code) = self.code.as_deref() {
            summary.push_str(&format!(" ({code})"));
        }
        if let Some(message) = self.message.as_deref() {
            summary.push_str(&format!(" - {message}"));
        }
        summary
    }

    pub fn alert_text(&self) -> String {
        format!("{}{ALERT_SUFFIX}", self.summary())
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{}", .0.summary())]
    Http(RequestFailure),
    #[error("response with status {status} is not valid json: {source}")]
    Decode {
        status: u16,
        source: serde_json::Error,
    },
    #[error("request could not be delivered: {message}")]
    Transport { message: String },
}

impl RequestError {
    pub fn failure(&self) -> Option<&RequestFailure> {
        match self {
            Self::Http(failure) => Some(failure),
            _ => None,
        }
    }
}

pub fn is_success_status(status: u16) -> bool {
    status <= SUCCESS_STATUS_MAX
}

pub fn classify_response(status: u16, body: &str) -> Result<Value, RequestError> {
    classify_response_for(status, body, true)
}

/// Like [`classify_response`], but a successful body that is not JSON only
/// counts as an error when `needs_body` says someone will read it. Otherwise
/// it is reported as `Value::Null`.
pub fn classify_response_for(status: u16, body: &str, needs_body: bool) -> Result<Value, RequestError> {
    if !is_success_status(status) {
        return Err(RequestError::Http(RequestFailure::from_response(status, body)));
    }
    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(_) if !needs_body => Ok(Value::Null),
        Err(source) => Err(RequestError::Decode { status, source }),
    }
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(false) => None,
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redirect_range_counts_as_success() {
        let value = classify_response(302, r#"{"ok":true}"#).expect("3xx is success");
        assert_eq!(value, json!({"ok": true}));
    }

    #[test]
    fn success_with_non_json_body_is_a_decode_error() {
        let error = classify_response(200, "<html>").expect_err("html body");
        assert!(matches!(error, RequestError::Decode { status: 200, .. }));
    }

    #[test]
    fn error_body_with_code_and_message() {
        let error = classify_response(
            422,
            r#"{"error_code":"E_DUP","error_message":"Slug already taken"}"#,
        )
        .expect_err("422 fails");
        let failure = error.failure().expect("http failure");
        assert_eq!(failure.summary(), "Server Error (E_DUP) - Slug already taken");
        assert_eq!(
            failure.alert_text(),
            "Server Error (E_DUP) - Slug already taken\nSee console for more details."
        );
    }

    #[test]
    fn numeric_error_code_is_rendered() {
        let failure = RequestFailure::from_response(500, r#"{"error_code":17}"#);
        assert_eq!(failure.summary(), "Server Error (17)");
    }

    #[test]
    fn unparsable_error_body_falls_back_to_status() {
        let failure = RequestFailure::from_response(503, "Service Unavailable");
        assert!(!failure.body_parsed);
        assert_eq!(failure.summary(), "Server Error (503)");
    }

    #[test]
    fn non_object_error_body_falls_back_to_status() {
        for body in ["null", r#""x""#, "[]", "17"] {
            let failure = RequestFailure::from_response(500, body);
            assert!(!failure.body_parsed, "{body}");
            assert_eq!(failure.summary(), "Server Error (500)", "{body}");
        }
    }

    #[test]
    fn unread_success_body_may_be_empty() {
        assert_eq!(classify_response_for(200, "", false).expect("no consumer"), Value::Null);
        assert_eq!(
            classify_response_for(200, r#"{"deleted":1}"#, false).expect("json still parsed"),
            json!({"deleted": 1})
        );
        let error = classify_response_for(200, "", true).expect_err("consumer needs json");
        assert!(matches!(error, RequestError::Decode { status: 200, .. }));
    }

    #[test]
    fn unread_error_body_still_fails() {
        let error = classify_response_for(404, "", false).expect_err("404 fails");
        assert_eq!(error.failure().map(RequestFailure::summary).as_deref(), Some("Server Error (404)"));
    }

    #[test]
    fn parsed_error_body_without_details_is_bare() {
        let failure = RequestFailure::from_response(500, "{}");
        assert_eq!(failure.summary(), "Server Error");
    }

    #[test]
    fn request_body_is_form_encoded() {
        let request = ApiRequest::new(
            "/records/save",
            FormPayload::new().with("name", "A&B").with("id", "7"),
        );
        assert_eq!(request.body(), "name=A%26B&id=7");
    }
}
