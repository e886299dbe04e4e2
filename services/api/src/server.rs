use crate::cli::ServeArgs;
use crate::demo::demo_dataset;
use crate::infra::{AppState, FileSettingsStore, HealthDataset, InMemoryHealthRepository};
use crate::routes::with_health_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use staff_health::config::AppConfig;
use staff_health::error::AppError;
use staff_health::workflows::health::HealthScoreService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let timezone = config.organization.timezone;
    let dataset = if args.demo_data {
        demo_dataset(Utc::now().with_timezone(&timezone).date_naive())
    } else {
        HealthDataset::default()
    };
    let repository = Arc::new(InMemoryHealthRepository::new(dataset, timezone));
    let settings = Arc::new(FileSettingsStore::new(
        config.organization.health_settings_path.clone(),
    ));
    let health_service = Arc::new(HealthScoreService::new(repository, settings, timezone));

    let app = with_health_routes(health_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %timezone,
        demo_data = args.demo_data,
        "health score service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
