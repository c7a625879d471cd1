use super::*;
use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
use shared::{
    domain::{ContactSubmission, FormField},
    error::ErrorCode,
    protocol::{FieldErrors, DELIVERY_FAILED_MESSAGE},
};
use tokio::net::TcpListener;

async fn spawn_contact_server(status: AxumStatus, body: serde_json::Value) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route(
        "/contact",
        post(move |Json(fields): Json<ContactFields>| {
            let body = body.clone();
            async move {
                assert_eq!(fields.name, "Al");
                (status, Json(body))
            }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/"))
}

fn scenario_a() -> ContactFields {
    ContactFields::new("Al", "al@x.com", "Hello there, I need help.")
}

#[tokio::test]
async fn accepted_submission_decodes_as_valid() {
    let submission = ContactSubmission {
        name: "Al".into(),
        email: "al@x.com".into(),
        message: "Hello there, I need help.".into(),
    };
    let server_url = spawn_contact_server(
        AxumStatus::OK,
        serde_json::to_value(ContactResponse::from(ValidationResult::Valid(
            submission.clone(),
        )))
        .expect("json"),
    )
    .await
    .expect("server");

    let backend = HttpContactBackend::new(server_url).expect("backend");
    let result = backend
        .validate_and_deliver(scenario_a())
        .await
        .expect("call");
    assert_eq!(result, ValidationResult::Valid(submission));
}

#[tokio::test]
async fn unprocessable_entity_decodes_field_errors() {
    let mut errors = FieldErrors::new();
    errors.push(FormField::Email, "Please enter a valid email address.");
    let server_url = spawn_contact_server(
        AxumStatus::UNPROCESSABLE_ENTITY,
        serde_json::to_value(ContactResponse::from(ValidationResult::Invalid(
            errors.clone(),
        )))
        .expect("json"),
    )
    .await
    .expect("server");

    let backend = HttpContactBackend::new(server_url).expect("backend");
    let result = backend
        .validate_and_deliver(scenario_a())
        .await
        .expect("call");
    assert_eq!(result, ValidationResult::Invalid(errors));
}

#[tokio::test]
async fn service_unavailable_decodes_form_error() {
    let server_url = spawn_contact_server(
        AxumStatus::SERVICE_UNAVAILABLE,
        serde_json::json!({
            "success": false,
            "errors": { "form": [DELIVERY_FAILED_MESSAGE] },
            "error_code": ErrorCode::DeliveryFailed,
        }),
    )
    .await
    .expect("server");

    let backend = HttpContactBackend::new(server_url).expect("backend");
    let result = backend
        .validate_and_deliver(scenario_a())
        .await
        .expect("call");
    let errors = result.errors().expect("invalid");
    assert_eq!(errors.first(FormField::Form), Some(DELIVERY_FAILED_MESSAGE));
}

#[tokio::test]
async fn unexpected_status_is_a_transport_error() {
    let server_url = spawn_contact_server(
        AxumStatus::INTERNAL_SERVER_ERROR,
        serde_json::json!({ "oops": true }),
    )
    .await
    .expect("server");

    let backend = HttpContactBackend::new(server_url).expect("backend");
    let err = backend
        .validate_and_deliver(scenario_a())
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("500"));
}

#[test]
fn trailing_slash_is_trimmed_from_server_url() {
    let backend = HttpContactBackend::new("http://localhost:8080/").expect("backend");
    assert_eq!(backend.server_url(), "http://localhost:8080");
}
