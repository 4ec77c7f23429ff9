use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_VALIDATE_UNIQUE_URL: &str = "/dw/utility/validate-unique/";
pub const DEFAULT_UPLOAD_URL: &str = "/dw/utility/upload-file";
pub const DEFAULT_DELETE_UPLOAD_URL: &str = "/dw/utility/delete-upload";
pub const DEFAULT_APPEND_FORM_SELECTOR: &str = "form.edit-form";
pub const DEFAULT_DELETE_CONTAINER_SELECTOR: &str = "[data-container=\"delete\"]";
pub const DEFAULT_BUSY_CLASS: &str = "working";
pub const DEFAULT_ACCEPTED_FILES: &str = "image/jpeg,image/png,image/gif";
pub const DEFAULT_MAX_FILESIZE_MB: f64 = 10.0;
pub const DEFAULT_COOKIE_DAYS: i64 = 365;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration json: {source}")]
    InvalidJson { source: serde_json::Error },
    #[error("configuration value '{field}' must not be empty")]
    EmptyValue { field: &'static str },
    #[error("configuration value 'max_filesize_mb' must be positive (got {value})")]
    InvalidMaxFilesize { value: f64 },
}

/// Page-wide settings. Any key missing from a supplied object keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub validate_unique_url: String,
    pub upload_url: String,
    pub delete_upload_url: String,
    pub append_form_selector: String,
    pub delete_container_selector: String,
    pub busy_class: String,
    pub accepted_files: String,
    pub max_filesize_mb: f64,
    pub cookie_days: i64,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_unique_url: DEFAULT_VALIDATE_UNIQUE_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            delete_upload_url: DEFAULT_DELETE_UPLOAD_URL.to_string(),
            append_form_selector: DEFAULT_APPEND_FORM_SELECTOR.to_string(),
            delete_container_selector: DEFAULT_DELETE_CONTAINER_SELECTOR.to_string(),
            busy_class: DEFAULT_BUSY_CLASS.to_string(),
            accepted_files: DEFAULT_ACCEPTED_FILES.to_string(),
            max_filesize_mb: DEFAULT_MAX_FILESIZE_MB,
            cookie_days: DEFAULT_COOKIE_DAYS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(trimmed)
            .map_err(|source| ConfigError::InvalidJson { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("validate_unique_url", &self.validate_unique_url),
            ("upload_url", &self.upload_url),
            ("delete_upload_url", &self.delete_upload_url),
            ("append_form_selector", &self.append_form_selector),
            ("delete_container_selector", &self.delete_container_selector),
            ("busy_class", &self.busy_class),
            ("log_filter", &self.log_filter),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyValue { field });
            }
        }
        if !self.max_filesize_mb.is_finite() || self.max_filesize_mb <= 0.0 {
            return Err(ConfigError::InvalidMaxFilesize {
                value: self.max_filesize_mb,
            });
        }
        Ok(())
    }
}
