use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::bridge::{BridgeState, route_through_chain};
use crate::chain::FilterChain;
use crate::chain::filters::{AuthGuard, InstanceFilter, VariantFilter};
use crate::config::Config;
use crate::instance::{CredentialStore, ServerInstance};
use crate::observability::Metrics;
use crate::resources::build_registry;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: SocketAddr) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    let app = build_app(&config);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "repohub server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Assembles the instance, registry, and filter chain — the startup-time
/// decisions — and mounts the chain behind the axum router.
pub fn build_app(config: &Config) -> Router {
    let instance = Arc::new(ServerInstance::new(CredentialStore::from_users(
        config.server.users.clone(),
    )));
    build_app_with_instance(config, instance)
}

/// Variant of [`build_app`] taking a pre-seeded instance; used by tests.
pub fn build_app_with_instance(config: &Config, instance: Arc<ServerInstance>) -> Router {
    let metrics = Arc::new(Metrics::new());

    // Ordering matters: the guard must run before anything that could
    // leak protected state, and before terminal routing.
    let chain = FilterChain::builder()
        .filter(Arc::new(InstanceFilter::new(instance)))
        .filter(Arc::new(AuthGuard::new(config.server.anonymous_allowed)))
        .filter(Arc::new(VariantFilter::new(config.server.default_variant)))
        .terminal(build_registry(), metrics);

    let state = BridgeState {
        chain: Arc::new(chain),
    };

    Router::new()
        .route("/health", get(health))
        .fallback(route_through_chain)
        .with_state(state)
        // Transparently decompress gzip request bodies before the chain
        // sees them.
        .layer(RequestDecompressionLayer::new())
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
