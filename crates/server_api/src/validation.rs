use std::sync::LazyLock;

use regex::Regex;
use shared::{
    domain::{ContactFields, ContactSubmission, FormField},
    error::ValidationError,
    protocol::FieldErrors,
};

pub const NAME_MIN_CHARS: usize = 2;
pub const MESSAGE_MIN_CHARS: usize = 10;

// Lookaround is unsupported by `regex`; leading dots and ".." runs in the local
// part are rejected in `is_valid_email` instead.
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern compiles")
});

pub fn is_valid_email(candidate: &str) -> bool {
    let Some((local, _)) = candidate.split_once('@') else {
        return false;
    };
    !local.starts_with('.') && !local.contains("..") && EMAIL.is_match(candidate)
}

fn check_name(name: &str) -> Option<ValidationError> {
    (name.chars().count() < NAME_MIN_CHARS).then_some(ValidationError::TooShort {
        field: FormField::Name,
        min: NAME_MIN_CHARS,
    })
}

fn check_email(email: &str) -> Option<ValidationError> {
    (!is_valid_email(email)).then_some(ValidationError::InvalidFormat {
        field: FormField::Email,
    })
}

fn check_message(message: &str) -> Option<ValidationError> {
    (message.chars().count() < MESSAGE_MIN_CHARS).then_some(ValidationError::TooShort {
        field: FormField::Message,
        min: MESSAGE_MIN_CHARS,
    })
}

/// Applies every rule to the trimmed fields and reports all violations at once.
pub fn validate(fields: &ContactFields) -> Result<ContactSubmission, FieldErrors> {
    let name = fields.name.trim();
    let email = fields.email.trim();
    let message = fields.message.trim();

    let errors: FieldErrors = [check_name(name), check_email(email), check_message(message)]
        .into_iter()
        .flatten()
        .collect();

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ContactSubmission {
        name: name.to_string(),
        email: email.to_string(),
        message: message.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
