#![cfg_attr(test, allow(clippy::expect_used))]
//! Browser-independent core of the DW page utilities: request encoding and
//! response classification, form and validation models, cookie and token
//! helpers, modal markup, and the edit-form and upload workflows.

pub mod config;
pub mod cookie;
pub mod edit_form;
pub mod form;
pub mod modal;
pub mod payload;
pub mod request;
pub mod selector;
pub mod session;
pub mod token;
pub mod upload;
pub mod validation;
