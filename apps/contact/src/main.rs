use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Parser;
use client_core::{
    ContactBackend, FormStateController, FormView, HttpContactBackend, SubmissionUiState,
    SUCCESS_MESSAGE,
};
use server_api::FormSubmissionHandler;
use shared::{
    domain::{ContactFields, FormField},
    protocol::ValidationResult,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Submit the portfolio contact form")]
struct Args {
    /// Base URL of a running contact server.
    #[arg(long, required_unless_present = "local", conflicts_with = "local")]
    server_url: Option<String>,
    /// Validate in-process instead of calling a server.
    #[arg(long)]
    local: bool,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    message: String,
    /// After a success, stay until the banner resets.
    #[arg(long)]
    wait_reset: bool,
}

/// Runs the handler in this process, the way the page calls it server-side.
struct LocalBackend(FormSubmissionHandler);

#[async_trait]
impl ContactBackend for LocalBackend {
    async fn validate_and_deliver(&self, fields: ContactFields) -> Result<ValidationResult> {
        Ok(self.0.validate_and_deliver(fields).await)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let backend: Arc<dyn ContactBackend> = match (&args.server_url, args.local) {
        (_, true) => Arc::new(LocalBackend(FormSubmissionHandler::default())),
        (Some(url), false) => Arc::new(HttpContactBackend::new(url.clone())?),
        (None, false) => bail!("either --server-url or --local is required"),
    };

    let controller = FormStateController::new(backend);
    controller.set_field(FormField::Name, args.name);
    controller.set_field(FormField::Email, args.email);
    controller.set_field(FormField::Message, args.message);

    let Some(pending) = controller.submit_draft() else {
        bail!("a submission is already in flight");
    };
    println!("{}", controller.view().submit_label());

    let settled = pending.finished().await?;
    print_view(&controller.view());

    if args.wait_reset && settled == SubmissionUiState::Succeeded {
        let mut states = controller.subscribe();
        while *states.borrow_and_update() != SubmissionUiState::Idle {
            states.changed().await?;
        }
        info!("success banner cleared");
        println!("Form ready for another message.");
    }

    Ok(())
}

fn print_view(view: &FormView) {
    if view.success_banner {
        println!("{SUCCESS_MESSAGE}");
    }
    for field in [
        FormField::Name,
        FormField::Email,
        FormField::Message,
        FormField::Form,
    ] {
        if let Some(error) = view.field_error(field) {
            println!("{field}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn local_backend_runs_the_handler_in_process() {
        let backend =
            LocalBackend(FormSubmissionHandler::default().with_response_delay(Duration::ZERO));
        let controller = FormStateController::new(Arc::new(backend));

        let settled = controller
            .submit(ContactFields::new("A", "not-an-email", "short"))
            .expect("started")
            .finished()
            .await
            .expect("join");

        let errors = settled.errors().expect("failed");
        assert_eq!(errors.fields().count(), 3);
    }

    #[test]
    fn local_and_remote_modes_conflict() {
        let parsed = Args::try_parse_from(["contact", "--local", "--server-url", "http://x"]);
        assert!(parsed.is_err());

        let parsed = Args::try_parse_from(["contact"]);
        assert!(parsed.is_err());
    }
}
