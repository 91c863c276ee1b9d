use anyhow::Result;
use application::{
    retry::RetryPolicy,
    usecases::{
        action_executor::ActionExecutor, billing_sweep::BillingSweepUseCase,
        record_payment::RecordPaymentUseCase, router_health::RouterHealthUseCase,
    },
};
use domain::repositories::{
    billing_sweep::BillingSweepRepository, notification_client::NotificationClient,
    payments::PaymentRepository, router_client::RouterClient, routers::RouterRepository,
};
use infra::{
    db::{
        postgres::postgres_connection,
        repositories::{
            billing_sweep::BillingSweepPostgres, payments::PaymentPostgres,
            routers::RouterPostgres,
        },
    },
    notifications::gateway::NotificationGatewayClient,
    routeros::client::RouterOsClient,
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{axum_http, config, services};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    // Shared collaborators: one HTTP client per external system.
    let router_client: Arc<dyn RouterClient + Send + Sync> =
        Arc::new(RouterOsClient::new(dotenvy_env.router_os.clone())?);
    let notification_client: Arc<dyn NotificationClient + Send + Sync> = Arc::new(
        NotificationGatewayClient::new(dotenvy_env.notification_gateway.clone())?,
    );

    let sweep_repository: Arc<dyn BillingSweepRepository + Send + Sync> =
        Arc::new(BillingSweepPostgres::new(Arc::clone(&db_pool_arc)));
    let payment_repository: Arc<dyn PaymentRepository + Send + Sync> =
        Arc::new(PaymentPostgres::new(Arc::clone(&db_pool_arc)));
    let router_repository: Arc<dyn RouterRepository + Send + Sync> =
        Arc::new(RouterPostgres::new(Arc::clone(&db_pool_arc)));

    let retry: RetryPolicy = dotenvy_env.retry.clone();
    let executor = Arc::new(ActionExecutor::new(
        Arc::clone(&sweep_repository),
        Arc::clone(&router_client),
        Arc::clone(&notification_client),
        retry,
    ));

    let sweep_usecase = Arc::new(BillingSweepUseCase::new(
        Arc::clone(&sweep_repository),
        executor,
        dotenvy_env.sweep.channels.clone(),
        dotenvy_env.sweep.concurrency,
    ));

    let payment_usecase = Arc::new(RecordPaymentUseCase::new(Arc::clone(&payment_repository)));

    let router_health_usecase = Arc::new(RouterHealthUseCase::new(
        Arc::clone(&router_repository),
        Arc::clone(&router_client),
    ));

    // Background loops; the HTTP server offers on-demand triggers for both.
    let sweep_loop = tokio::spawn(services::sweep_loop::run(
        Arc::clone(&sweep_usecase),
        dotenvy_env.sweep.interval_secs,
        dotenvy_env.sweep.deadline_secs,
    ));

    let router_health_loop = tokio::spawn(services::router_health_loop::run(
        router_health_usecase,
        dotenvy_env.router_health.interval_secs,
    ));

    let http_server = tokio::spawn(axum_http::http_serve::start(
        Arc::clone(&dotenvy_env),
        sweep_usecase,
        payment_usecase,
    ));

    tokio::select! {
        result = sweep_loop => result??,
        result = router_health_loop => result??,
        result = http_server => result??,
    };
    Ok(())
}
