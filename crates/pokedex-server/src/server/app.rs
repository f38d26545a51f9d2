use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use anyhow::Context;
use pokedex_classifier::{ImageClassifier, Provisioner, ResnetClassifier};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{CorsConfig, ServerConfig};
use crate::server::{routes, static_files};
use crate::state::AppState;
use metrics_exporter_prometheus::PrometheusHandle;

/// Room left for multipart boundaries and part headers above the file limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the Axum application
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let cors = cors_layer(&state.config.cors);
    let static_dir = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(static_files::index))
        .route("/analyze", post(routes::analyze))
        .route("/health", get(routes::health))
        .route("/labels", get(routes::labels))
        .route("/metrics", get(routes::metrics))
        .nest_service("/static", static_dir)
        .fallback(routes::fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
        ])
}

/// Fetch the artifact if needed and load it
pub async fn provision_model(config: &ServerConfig) -> anyhow::Result<ResnetClassifier> {
    let model_config = config
        .model_config()
        .context("invalid model configuration")?;

    Provisioner::new()?
        .provision(&model_config)
        .await
        .context("model provisioning failed")
}

/// Serve until a shutdown signal arrives, then drain in-flight requests
pub async fn run_server(
    config: ServerConfig,
    classifier: Arc<dyn ImageClassifier>,
    metrics_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    let mut state = AppState::new(config, classifier);
    if let Some(handle) = metrics_handle {
        state = state.with_metrics(handle);
    }

    let addr = state.config.bind_address();
    let pool = Arc::clone(&state.pool);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Pokedex listening on http://{}", listener.local_addr()?);
    info!(
        "Model {} with {} inference workers",
        pool.classifier_name(),
        pool.workers()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close();
    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, stopping server...");
}
