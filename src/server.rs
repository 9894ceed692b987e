use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    engines::{EngineSettings, Studio},
    handlers::{self, AppState},
    metrics,
    observability::LogService,
    providers::gemini::GeminiProvider,
    signals::{setup_signal_handlers, ShutdownSignal},
    throttler::Throttler,
};

/// Start the studio gateway
///
/// This function:
/// 1. Initializes metrics (when enabled)
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Wires provider, admission gate and request log into the engines
/// 4. Binds to the configured address
/// 5. Serves requests until a shutdown signal arrives
pub async fn start_server(config: Config) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let state = build_state(&config, shutdown_tx)?;

    let metrics_route = metrics_handle
        .as_ref()
        .map(|handle| (config.metrics.endpoint.as_str(), handle.clone()));
    let app = create_router(
        state,
        metrics_route,
        config.server.body_limit_mb * 1024 * 1024,
    );

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting studio gateway on {}", addr);
    info!(
        max_concurrent = config.throttle.max_concurrent,
        admission_timeout_seconds = ?config.throttle.admission_timeout_seconds,
        image_model = %config.gemini.image_model,
        text_model = %config.gemini.text_model,
        "Engine configuration"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Build the shared handler state from configuration
pub fn build_state(
    config: &Config,
    shutdown: broadcast::Sender<ShutdownSignal>,
) -> Result<AppState> {
    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let provider = Arc::new(GeminiProvider::new(http_client, config.gemini.clone()));
    let throttler = Arc::new(Throttler::new(config.throttle.max_concurrent)?);

    let studio = Studio::new(
        provider,
        throttler,
        LogService::new(),
        EngineSettings::from_config(config),
    );

    Ok(AppState::new(Arc::new(studio), shutdown))
}

/// Create the Axum router with all routes and middleware
pub fn create_router(
    state: AppState,
    metrics_route: Option<(&str, Arc<PrometheusHandle>)>,
    body_limit_bytes: usize,
) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::health::health_check))
        .route("/api/vto", post(handlers::engines::handle_vto))
        .route("/api/logo", post(handlers::engines::handle_logo))
        .route("/api/ui", post(handlers::engines::handle_ui))
        .route("/api/analyze", post(handlers::engines::handle_analyze))
        .route("/api/logs", get(handlers::logs::list_logs))
        .route("/api/logs/stream", get(handlers::logs::stream_logs))
        .route("/api/throttle", get(handlers::logs::throttle_stats))
        .with_state(state);

    let router = match metrics_route {
        Some((endpoint, handle)) => Router::new()
            .route(endpoint, get(handlers::metrics_handler::metrics))
            .with_state(handle)
            .merge(api_routes),
        None => api_routes,
    };

    router
        // Images arrive inline as base64, so the limit is well above axum's default
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
