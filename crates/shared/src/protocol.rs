use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{ContactSubmission, FormField},
    error::{ErrorCode, ValidationError},
};

/// Form-level text shown when a submission validated but could not be delivered.
pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";

/// Per-field error messages. Passing fields have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(FormField::Form, message);
        errors
    }

    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn record(&mut self, error: ValidationError) {
        self.push(error.field(), error.to_string());
    }

    pub fn get(&self, field: FormField) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    /// The message rendered inline; the rest are kept but not shown.
    pub fn first(&self, field: FormField) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<ValidationError> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        let mut errors = Self::new();
        for error in iter {
            errors.record(error);
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(ContactSubmission),
    Invalid(FieldErrors),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(errors) => Some(errors),
        }
    }

    /// Coarse classification for logs and the wire; never shown to the visitor.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(errors) if errors.contains(FormField::Form) => {
                Some(ErrorCode::DeliveryFailed)
            }
            ValidationResult::Invalid(_) => Some(ErrorCode::Validation),
        }
    }
}

/// JSON body returned by `POST /contact`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ContactSubmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("successful contact response carried no data")]
    MissingData,
    #[error("failed contact response carried no errors")]
    MissingErrors,
}

impl From<ValidationResult> for ContactResponse {
    fn from(result: ValidationResult) -> Self {
        let error_code = result.error_code();
        match result {
            ValidationResult::Valid(submission) => Self {
                success: true,
                data: Some(submission),
                errors: None,
                error_code,
            },
            ValidationResult::Invalid(errors) => Self {
                success: false,
                data: None,
                errors: Some(errors),
                error_code,
            },
        }
    }
}

impl TryFrom<ContactResponse> for ValidationResult {
    type Error = MalformedResponse;

    fn try_from(response: ContactResponse) -> Result<Self, Self::Error> {
        if response.success {
            response
                .data
                .map(ValidationResult::Valid)
                .ok_or(MalformedResponse::MissingData)
        } else {
            match response.errors {
                Some(errors) if !errors.is_empty() => Ok(ValidationResult::Invalid(errors)),
                _ => Err(MalformedResponse::MissingErrors),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_serialize_as_snake_case_map() {
        let mut errors = FieldErrors::new();
        errors.push(FormField::Email, "Please enter a valid email address.");
        errors.push(FormField::Name, "Name must be at least 2 characters.");

        let json = serde_json::to_value(&errors).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "name": ["Name must be at least 2 characters."],
                "email": ["Please enter a valid email address."],
            })
        );
    }

    #[test]
    fn first_returns_only_the_leading_message() {
        let mut errors = FieldErrors::new();
        errors.push(FormField::Message, "first");
        errors.push(FormField::Message, "second");

        assert_eq!(errors.first(FormField::Message), Some("first"));
        assert_eq!(errors.get(FormField::Message).map(<[String]>::len), Some(2));
        assert_eq!(errors.first(FormField::Name), None);
    }

    #[test]
    fn delivery_failure_is_classified_separately_from_field_errors() {
        let delivery = ValidationResult::Invalid(FieldErrors::form(DELIVERY_FAILED_MESSAGE));
        assert_eq!(delivery.error_code(), Some(ErrorCode::DeliveryFailed));

        let fields: FieldErrors = [ValidationError::TooShort {
            field: FormField::Name,
            min: 2,
        }]
        .into_iter()
        .collect();
        assert_eq!(
            ValidationResult::Invalid(fields).error_code(),
            Some(ErrorCode::Validation)
        );
    }

    #[test]
    fn failed_response_without_errors_is_malformed() {
        let response: ContactResponse =
            serde_json::from_str(r#"{"success": false}"#).expect("json");
        assert!(matches!(
            ValidationResult::try_from(response),
            Err(MalformedResponse::MissingErrors)
        ));
    }

    #[test]
    fn validation_error_messages_read_like_form_hints() {
        let too_short = ValidationError::TooShort {
            field: FormField::Message,
            min: 10,
        };
        let bad_email = ValidationError::InvalidFormat {
            field: FormField::Email,
        };
        assert_eq!(
            too_short.to_string(),
            "Message must be at least 10 characters."
        );
        assert_eq!(bad_email.to_string(), "Please enter a valid email address.");
    }
}
