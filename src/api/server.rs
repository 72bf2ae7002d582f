use crate::api::handlers;
use crate::service::RateService;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RateService>,
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/exchange_rates", get(handlers::index))
        .route(
            "/exchange_rates/convert",
            get(handlers::convert).post(handlers::convert_form),
        )
        .route("/exchange_rates/{code}", get(handlers::show))
}

/// Builds the application router. Routes are served at the root and under
/// `/api/v1`.
pub fn router(service: Arc<RateService>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .merge(routes())
        .nest("/api/v1", routes())
        .with_state(AppState { service })
}

pub async fn run(bind: &str, service: Arc<RateService>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
