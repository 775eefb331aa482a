use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_directory_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tastemap::config::AppConfig;
use tastemap::error::AppError;
use tastemap::moderation::StaticTokenGate;
use tastemap::store::SqliteStore;
use tastemap::telemetry;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(url) = args.database_url.take() {
        config.database.url = url;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(SqliteStore::connect(&config.database.url).await?);
    info!(database = %config.database.url, "submission store ready");

    let gate = StaticTokenGate::new(config.admin.token.clone());
    if !gate.is_configured() {
        warn!("APP_ADMIN_TOKEN is not set; every admin request will be refused");
    }
    let services = Services::new(store, gate);

    let app = with_directory_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "restaurant directory service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
