use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::FormField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Validation,
    DeliveryFailed,
    PayloadTooLarge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A rule violation scoped to a single input field. `Display` is the text shown
/// next to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{} must be at least {min} characters.", label(.field))]
    TooShort { field: FormField, min: usize },
    #[error("Please enter a valid {field} address.")]
    InvalidFormat { field: FormField },
}

impl ValidationError {
    pub fn field(&self) -> FormField {
        match self {
            ValidationError::TooShort { field, .. } | ValidationError::InvalidFormat { field } => {
                *field
            }
        }
    }
}

fn label(field: &FormField) -> &'static str {
    match field {
        FormField::Name => "Name",
        FormField::Email => "Email",
        FormField::Message => "Message",
        FormField::Form => "Form",
    }
}
