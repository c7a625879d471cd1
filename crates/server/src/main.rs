use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use server_api::FormSubmissionHandler;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let state = AppState {
        contact: FormSubmissionHandler::default().with_response_delay(settings.response_delay),
    };
    let app = build_router(Arc::new(state), &settings);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        response_delay_ms = settings.response_delay.as_millis() as u64,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn build_router(state: Arc<AppState>, settings: &Settings) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(api::contact_route(), post(api::submit_contact))
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
