use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{ContactFields, ContactSubmission},
    protocol::{FieldErrors, ValidationResult, DELIVERY_FAILED_MESSAGE},
};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

pub mod validation;

/// Latency applied before every response so the client's pending state is visible.
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery target unavailable: {0}")]
    Unavailable(String),
    #[error("delivery target rejected the submission: {0}")]
    Rejected(String),
}

/// Forwards a validated submission somewhere useful (mail relay, datastore).
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, submission: &ContactSubmission) -> Result<(), DeliveryError>;
}

/// Placeholder delivery that only records the submission in the log.
pub struct LogDelivery;

#[async_trait]
impl Delivery for LogDelivery {
    async fn deliver(&self, submission: &ContactSubmission) -> Result<(), DeliveryError> {
        debug!(
            name = %submission.name,
            email = %submission.email,
            message_chars = submission.message.chars().count(),
            received_at = %Utc::now(),
            "contact message queued for delivery"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct FormSubmissionHandler {
    delivery: Arc<dyn Delivery>,
    response_delay: Duration,
}

impl Default for FormSubmissionHandler {
    fn default() -> Self {
        Self::new(Arc::new(LogDelivery))
    }
}

impl FormSubmissionHandler {
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self {
            delivery,
            response_delay: DEFAULT_RESPONSE_DELAY,
        }
    }

    pub fn with_response_delay(mut self, response_delay: Duration) -> Self {
        self.response_delay = response_delay;
        self
    }

    pub fn response_delay(&self) -> Duration {
        self.response_delay
    }

    pub async fn validate_and_deliver(&self, fields: ContactFields) -> ValidationResult {
        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }

        let submission = match validation::validate(&fields) {
            Ok(submission) => submission,
            Err(errors) => {
                let failing: Vec<_> = errors.fields().collect();
                debug!(?failing, "contact submission rejected");
                return ValidationResult::Invalid(errors);
            }
        };

        let submission_id = Uuid::new_v4();
        if let Err(err) = self.delivery.deliver(&submission).await {
            error!(%submission_id, error = %err, "contact submission delivery failed");
            return ValidationResult::Invalid(FieldErrors::form(DELIVERY_FAILED_MESSAGE));
        }

        info!(%submission_id, ?submission, "form submission received");
        ValidationResult::Valid(submission)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
