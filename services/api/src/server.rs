use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryBlobStore, InMemoryUserRepository};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crushisen::config::AppConfig;
use crushisen::error::AppError;
use crushisen::telemetry;
use crushisen::workflows::registration::RegistrationService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryUserRepository::default());
    let blobs = Arc::new(InMemoryBlobStore::new(&config.storage.public_base_url));
    let registration_service = Arc::new(RegistrationService::new(
        repository,
        blobs,
        config.registration.clone(),
    ));

    let app = with_registration_routes(registration_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lookup_policy = ?config.registration.lookup_policy,
        "crushisen account service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
