//! Structural failures of a validation run.
//!
//! Validator-level failures are not errors: a failing check returns `Ok(false)`
//! and appends a [`Message`](crate::models::message::Message). Everything here
//! aborts the current call.

use std::convert::Infallible;

/// Result alias used across the crate.
pub type ValidationResult<T> = Result<T, ValidationFailure>;

/// Errors that abort registration or a validation run
#[derive(Debug, thiserror::Error)]
pub enum ValidationFailure {
    #[error("There are no validators to validate")]
    NoValidators,

    #[error("The validator scope is not valid")]
    InvalidRuleScope,

    #[error("One of the validators is not valid: {0:?}")]
    InvalidValidator(String),

    #[error("Data to validate must be an array or object")]
    InvalidData,

    #[error("There is no data to validate")]
    NoDataToValidate,

    #[error("Entity must be an object")]
    InvalidEntity,

    #[error("A filter service is required to sanitize filtered fields")]
    FilterServiceUnavailable,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Filter failed on field '{field}': {reason}")]
    Filter { field: String, reason: String },

    #[error("Option '{option}' is invalid: {reason}")]
    InvalidOption { option: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse failed: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ValidationFailure {
    pub(crate) fn field_selector() -> Self {
        ValidationFailure::InvalidArgument(
            "field must be a name or a list of names".to_string(),
        )
    }
}

impl From<Infallible> for ValidationFailure {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
