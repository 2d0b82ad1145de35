use rand::Rng;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::errors::WorkerError;
use crate::models::merchant::Merchant;
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::refund::Refund;
use crate::queue;
use crate::services::refund_service::{self, RefundJobPayload};
use crate::services::webhook_service;
use crate::workers::{run_poll_loop, WorkerContext};

pub struct RefundWorker {
    ctx: WorkerContext,
}

impl RefundWorker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        run_poll_loop("refund-processing", shutdown_rx, || self.poll_once()).await;
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let Some(lease) = self.ctx.queue.pull_and_lease(queue::REFUND_PROCESSING).await? else {
            return Ok(());
        };

        match self.process(&lease.payload).await {
            Ok(()) => self.ctx.queue.complete(&lease).await?,
            Err(e) => {
                warn!(job_id = %lease.job_id, error = %e, "refund job failed, queue will retry");
                self.ctx.queue.fail(&lease).await?;
            }
        }

        Ok(())
    }

    async fn process(&self, raw_payload: &serde_json::Value) -> Result<(), WorkerError> {
        let payload: RefundJobPayload = serde_json::from_value(raw_payload.clone())
            .map_err(|e| WorkerError::BadPayload(e.to_string()))?;

        let refund = sqlx::query_as::<_, Refund>("SELECT * FROM refunds WHERE id = $1")
            .bind(&payload.refund_id)
            .fetch_optional(&self.ctx.pool)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(payload.refund_id.clone()))?;

        if refund.status != crate::models::refund::RefundStatus::Pending {
            return Ok(());
        }

        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(&refund.payment_id)
            .fetch_optional(&self.ctx.pool)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(refund.payment_id.clone()))?;

        // A refund only ever gets created against a successful payment,
        // but a payment row can never revert out of `success`, so this
        // can only trip on corrupted data; treat it as a benign no-op
        // rather than a hard failure, per spec.
        if payment.status != PaymentStatus::Success {
            return Ok(());
        }

        let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
            .bind(refund.merchant_id)
            .fetch_optional(&self.ctx.pool)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(refund.merchant_id.to_string()))?;

        self.simulate_processing_delay().await;

        let Some(updated) = refund_service::mark_refund_processed(&self.ctx.pool, &refund.id).await?
        else {
            return Ok(());
        };

        info!(refund_id = %updated.id, "refund processed");

        if merchant.webhook_url.is_some() {
            let data = webhook_service::refund_webhook_data(&updated);
            webhook_service::enqueue_event(&self.ctx.queue, merchant.id, "refund.processed", data)
                .await?;
        }

        Ok(())
    }

    async fn simulate_processing_delay(&self) {
        let delay_ms = if self.ctx.config.test_mode {
            self.ctx.config.test_processing_delay.unwrap_or(0)
        } else {
            rand::thread_rng().gen_range(3000..=5000)
        };
        sleep(Duration::from_millis(delay_ms)).await;
    }
}
