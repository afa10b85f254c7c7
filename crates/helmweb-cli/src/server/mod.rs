//! HTTP API
//!
//! Routes translate requests into option bags and hand them to the helm
//! client; every decision about commands and output lives below this layer.

mod error;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use helmweb_helm::{HelmClient, IngressRuleManager, PortAllocator};

/// Uploaded chart archives above this size are rejected
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub helm: HelmClient,
    /// URL of the `pase` chart repository, probed by `/health`
    pub pase_repo: String,
    pub http: reqwest::Client,
    pub ports: Option<Arc<dyn PortAllocator>>,
    pub ingress: Option<Arc<dyn IngressRuleManager>>,
}

impl AppState {
    pub fn new(helm: HelmClient, pase_repo: impl Into<String>) -> Self {
        Self {
            helm,
            pase_repo: pase_repo.into(),
            http: reqwest::Client::new(),
            ports: None,
            ingress: None,
        }
    }
}

/// Creates the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Deployments
        .route("/install", post(handlers::install))
        .route("/simulateInstall", post(handlers::simulate_install))
        .route("/upgrade", post(handlers::upgrade))
        .route("/delete", post(handlers::delete))
        .route("/offline", post(handlers::offline))
        .route("/rollback", post(handlers::rollback))
        // Queries
        .route("/list", get(handlers::list))
        .route("/history", get(handlers::history))
        .route("/search", get(handlers::search))
        .route("/inspect", get(handlers::inspect))
        .route("/repoList", get(handlers::repo_list))
        .route("/repoUpdate", get(handlers::repo_update))
        // Charts
        .route(
            "/push",
            post(handlers::push).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        // Collaborators
        .route("/getPort", get(handlers::get_port))
        .route("/setrule", post(handlers::set_rule))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
