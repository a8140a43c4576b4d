use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryDocumentStore, InMemoryNotificationQueue,
    InMemoryUserDirectory,
};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sellerflow::config::AppConfig;
use sellerflow::error::AppError;
use sellerflow::telemetry;
use sellerflow::workflows::onboarding::applications::{AccountRole, PageLimits, ReviewService};
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

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let notifications = Arc::new(InMemoryNotificationQueue::default());
    seed_demo_accounts(&directory);

    let page_limits = PageLimits {
        default_limit: config.pagination.default_limit,
        max_limit: config.pagination.max_limit,
    };
    let review_service = Arc::new(ReviewService::new(
        repository,
        directory,
        documents,
        notifications,
        page_limits,
    ));

    let app = with_application_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "seller application review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// The in-memory user directory starts empty, which would make every
/// approval fail; seed a few accounts so the service is usable out of
/// the box.
fn seed_demo_accounts(directory: &InMemoryUserDirectory) {
    directory.add_account("buyer-olive", AccountRole::Buyer);
    directory.add_account("buyer-theo", AccountRole::Buyer);
    directory.add_account("seller-sam", AccountRole::Seller);
    directory.add_account("admin-ada", AccountRole::Administrator);
}
