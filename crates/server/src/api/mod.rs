use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use shared::{
    domain::ContactFields,
    error::{ApiError, ErrorCode},
    protocol::{ContactResponse, ValidationResult},
};
use tracing::warn;

use crate::app_state::AppState;

pub fn contact_route() -> &'static str {
    "/contact"
}

pub(crate) async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactResponse>), (StatusCode, Json<ApiError>)> {
    let Json(fields) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected malformed contact payload");
        let code = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ErrorCode::PayloadTooLarge
        } else {
            ErrorCode::BadRequest
        };
        (
            rejection.status(),
            Json(ApiError::new(code, rejection.body_text())),
        )
    })?;

    let result = state.contact.validate_and_deliver(fields).await;
    Ok((status_for(&result), Json(ContactResponse::from(result))))
}

fn status_for(result: &ValidationResult) -> StatusCode {
    match result.error_code() {
        None => StatusCode::OK,
        Some(ErrorCode::DeliveryFailed) => StatusCode::SERVICE_UNAVAILABLE,
        Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
