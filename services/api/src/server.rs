use crate::cli::ServeArgs;
use crate::infra::{AppState, ApplicationStore};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use heartbeats::config::AppConfig;
use heartbeats::error::AppError;
use heartbeats::telemetry;
use heartbeats::workflows::membership::applications::{
    ApplicationState, StaticCredentialAuthenticator,
};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(ApplicationStore::open(&config.intake)?);
    let auth = Arc::new(StaticCredentialAuthenticator::from_config(&config.admin));

    let state = ApplicationState::new(store, auth)
        .with_institution_domain(&config.intake.institution_domain);
    info!(
        institution_domain = %config.intake.institution_domain,
        "intake form defaults configured"
    );

    let app = with_application_routes(state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "heartbeats membership service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
