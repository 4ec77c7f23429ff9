//! Reads the claims segment of a JSON Web Token.
//!
//! Nothing here checks the signature. The returned claims are whatever the
//! token says and must not be used for authorization decisions.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

const TOKEN_SEGMENTS: usize = 3;

const URL_SAFE_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("token must have {TOKEN_SEGMENTS} segments, found {found}")]
    SegmentCount { found: usize },
    #[error("token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("token payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn decode_token_payload_unverified(token: &str) -> Result<Value, TokenDecodeError> {
    let text = payload_text(token)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn decode_token_claims_unverified<T: DeserializeOwned>(token: &str) -> Result<T, TokenDecodeError> {
    let text = payload_text(token)?;
    Ok(serde_json::from_str(&text)?)
}

fn payload_text(token: &str) -> Result<String, TokenDecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != TOKEN_SEGMENTS {
        return Err(TokenDecodeError::SegmentCount {
            found: segments.len(),
        });
    }
    let bytes = URL_SAFE_ANY_PADDING.decode(segments[1])?;
    Ok(String::from_utf8(bytes)?)
}
