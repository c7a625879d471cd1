use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::ContactFields,
    protocol::{ContactResponse, ValidationResult},
};
use tracing::debug;

/// Upper bound for a single `POST /contact` round trip.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The one call a form makes per submission. An `Err` is a transport failure;
/// rejected input comes back as `Ok(ValidationResult::Invalid(..))`.
#[async_trait]
pub trait ContactBackend: Send + Sync {
    async fn validate_and_deliver(&self, fields: ContactFields) -> Result<ValidationResult>;
}

pub struct HttpContactBackend {
    http: Client,
    server_url: String,
}

impl HttpContactBackend {
    pub fn new(server_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl ContactBackend for HttpContactBackend {
    async fn validate_and_deliver(&self, fields: ContactFields) -> Result<ValidationResult> {
        let response = self
            .http
            .post(format!("{}/contact", self.server_url))
            .json(&fields)
            .send()
            .await
            .context("contact request failed")?;

        let status = response.status();
        debug!(%status, "contact endpoint responded");
        if !carries_contact_body(status) {
            let body = response.text().await.unwrap_or_default();
            bail!("contact endpoint returned {status}: {body}");
        }

        let body: ContactResponse = response
            .json()
            .await
            .context("contact response was not valid json")?;
        Ok(ValidationResult::try_from(body)?)
    }
}

fn carries_contact_body(status: StatusCode) -> bool {
    status.is_success()
        || status == StatusCode::UNPROCESSABLE_ENTITY
        || status == StatusCode::SERVICE_UNAVAILABLE
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
