use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paygate_backend::config::Config;
use paygate_backend::db::Database;
use paygate_backend::queue::Queue;
use paygate_backend::workers::payment_worker::PaymentWorker;
use paygate_backend::workers::refund_worker::RefundWorker;
use paygate_backend::workers::webhook_deliverer::WebhookDeliverer;
use paygate_backend::workers::WorkerContext;

/// Runs the payment worker, refund worker, and webhook deliverer as three
/// polling tasks in one process. Operators may run more than one copy of
/// this binary; the queue's `FOR UPDATE SKIP LOCKED` lease guarantees no
/// two copies ever process the same job.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    db.run_migrations().await.expect("failed to run migrations");

    let queue = Queue::new(db.pool.clone());

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build webhook http client");

    let ctx = WorkerContext {
        pool: db.pool.clone(),
        queue: Arc::new(queue),
        config: Arc::new(config),
        http,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let payment_worker = PaymentWorker::new(ctx.clone());
    let refund_worker = RefundWorker::new(ctx.clone());
    let webhook_deliverer = WebhookDeliverer::new(ctx.clone());

    let payment_rx = shutdown_rx.clone();
    let refund_rx = shutdown_rx.clone();
    let webhook_rx = shutdown_rx;

    let handles = vec![
        tokio::spawn(async move { payment_worker.run(payment_rx).await }),
        tokio::spawn(async move { refund_worker.run(refund_rx).await }),
        tokio::spawn(async move { webhook_deliverer.run(webhook_rx).await }),
    ];

    info!("paygate-worker started");

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl-c");
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    info!("paygate-worker stopped");
}
