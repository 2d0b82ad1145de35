pub mod payment_worker;
pub mod refund_worker;
pub mod webhook_deliverer;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::error;

use crate::config::Config;
use crate::queue::Queue;

/// How often each worker polls its queue when no job is immediately
/// available. The queue itself carries no push/notify channel, so all
/// three workers are simple tickers built on `interval(...)` combined
/// with `tokio::select!`.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shared handles every worker needs, the background-process analogue of
/// `AppState`.
#[derive(Clone)]
pub struct WorkerContext {
    pub pool: PgPool,
    pub queue: Arc<Queue>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

/// Drives a single poll-lease-process cycle on a ticker until `shutdown_rx`
/// fires, logging (not panicking on) any error the cycle returns.
pub async fn run_poll_loop<F, Fut>(
    name: &str,
    mut shutdown_rx: watch::Receiver<bool>,
    mut cycle: F,
) where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), crate::errors::WorkerError>>,
{
    tracing::info!(worker = name, "worker started");
    let mut ticker = interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                tracing::info!(worker = name, "shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = cycle().await {
                    error!(worker = name, error = %e, "worker cycle failed");
                }
            }
        }
    }

    tracing::info!(worker = name, "worker stopped");
}
