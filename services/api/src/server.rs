use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryDealStore};
use crate::routes::with_deal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use bay_street::config::AppConfig;
use bay_street::error::AppError;
use bay_street::telemetry;
use bay_street::universe::CsvDealStore;
use bay_street::{DealService, ScoringEngine};
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

    let engine = ScoringEngine::default();
    let routes = match config.store.path.clone() {
        Some(path) => {
            info!(path = %path.display(), "persisting deal universe to csv");
            let store = Arc::new(CsvDealStore::new(path));
            with_deal_routes(Arc::new(DealService::new(store, engine, config.portfolio)))
        }
        None => {
            let store = Arc::new(InMemoryDealStore::default());
            with_deal_routes(Arc::new(DealService::new(store, engine, config.portfolio)))
        }
    };

    let app = routes.layer(Extension(app_state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        objective = config.portfolio.objective.label(),
        "bay street deal service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
