use serde_json::Value;
use thiserror::Error;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("request data must be a key/value object")]
    NotAnObject,
    #[error("form body segment '{segment}' is not valid percent-encoded utf-8")]
    Decode { segment: String },
}

/// Flat key/value request data. Keys are unique; insertion order is kept so the
/// encoded body is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    entries: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_object(value: &Value) -> Result<Self, PayloadError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => {
                let mut payload = Self::new();
                for (key, value) in map {
                    payload.insert(key.clone(), scalar_text(value));
                }
                Ok(payload)
            }
            _ => Err(PayloadError::NotAnObject),
        }
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn encode(&self) -> String {
        self.iter()
            .map(|(key, value)| encode_pair(key, value))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `key=value` joined with `&`, nothing escaped.
    pub fn encode_raw(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}

pub fn encode_pair(key: &str, value: &str) -> String {
    format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(value)
    )
}

pub fn decode_form_body(body: &str) -> Result<Vec<(String, String)>, PayloadError> {
    body.split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let decode = |part: &str| {
                urlencoding::decode(part)
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| PayloadError::Decode {
                        segment: segment.to_string(),
                    })
            };
            Ok((decode(key)?, decode(value)?))
        })
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
