use rand::Rng;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::WorkerError;
use crate::models::merchant::Merchant;
use crate::models::payment::{Payment, PaymentMethodKind, PaymentStatus};
use crate::queue;
use crate::services::payment_service::{self, PaymentJobPayload};
use crate::services::webhook_service;
use crate::workers::{run_poll_loop, WorkerContext};

pub struct PaymentWorker {
    ctx: WorkerContext,
}

impl PaymentWorker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        run_poll_loop("payment-processing", shutdown_rx, || self.poll_once()).await;
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let Some(lease) = self.ctx.queue.pull_and_lease(queue::PAYMENT_PROCESSING).await? else {
            return Ok(());
        };

        match self.process(&lease.payload).await {
            Ok(()) => self.ctx.queue.complete(&lease).await?,
            Err(e) => {
                warn!(job_id = %lease.job_id, error = %e, "payment job failed, queue will retry");
                self.ctx.queue.fail(&lease).await?;
            }
        }

        Ok(())
    }

    async fn process(&self, raw_payload: &serde_json::Value) -> Result<(), WorkerError> {
        let payload: PaymentJobPayload = serde_json::from_value(raw_payload.clone())
            .map_err(|e| WorkerError::BadPayload(e.to_string()))?;

        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
                .bind(&payload.payment_id)
                .fetch_optional(&self.ctx.pool)
                .await?
                .ok_or_else(|| WorkerError::JobNotFound(payload.payment_id.clone()))?;

        // Already terminal from a prior attempt of this same job (queue
        // retry after a crash between the update and `complete()`).
        if payment.status != PaymentStatus::Pending {
            return Ok(());
        }

        let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
            .bind(payment.merchant_id)
            .fetch_optional(&self.ctx.pool)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(payment.merchant_id.to_string()))?;

        self.simulate_processing_delay().await;
        let success = self.decide_outcome(payment.method);

        let (status, error_code, error_description) = if success {
            (PaymentStatus::Success, None, None)
        } else {
            (
                PaymentStatus::Failed,
                Some("PAYMENT_FAILED"),
                Some("Payment processing failed"),
            )
        };

        let updated = payment_service::mark_payment_terminal(
            &self.ctx.pool,
            &payment.id,
            status,
            error_code,
            error_description,
        )
        .await?;

        let Some(updated) = updated else {
            // Someone else already moved this row off `pending`; nothing
            // left to do.
            return Ok(());
        };

        info!(payment_id = %updated.id, status = ?updated.status, "payment processed");

        if merchant.webhook_url.is_some() {
            let event = match updated.status {
                PaymentStatus::Success => "payment.success",
                PaymentStatus::Failed => "payment.failed",
                PaymentStatus::Pending => unreachable!("just set to a terminal status"),
            };

            enqueue_payment_webhook(&self.ctx, merchant.id, event, &updated).await?;
        }

        Ok(())
    }

    async fn simulate_processing_delay(&self) {
        let delay_ms = if self.ctx.config.test_mode {
            self.ctx.config.test_processing_delay.unwrap_or(0)
        } else {
            rand::thread_rng().gen_range(5000..=10000)
        };
        sleep(Duration::from_millis(delay_ms)).await;
    }

    fn decide_outcome(&self, method: PaymentMethodKind) -> bool {
        if self.ctx.config.test_mode {
            return self.ctx.config.test_payment_success.unwrap_or(true);
        }

        let success_probability = match method {
            PaymentMethodKind::Upi => 0.90,
            PaymentMethodKind::Card => 0.95,
        };
        rand::thread_rng().gen_bool(success_probability)
    }
}

async fn enqueue_payment_webhook(
    ctx: &WorkerContext,
    merchant_id: Uuid,
    event: &str,
    payment: &Payment,
) -> Result<(), WorkerError> {
    let data = webhook_service::payment_webhook_data(payment);
    webhook_service::enqueue_event(&ctx.queue, merchant_id, event, data).await?;
    Ok(())
}
