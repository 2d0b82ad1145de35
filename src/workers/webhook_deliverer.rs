use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::WorkerError;
use crate::models::merchant::Merchant;
use crate::models::webhook::{truncate_response_body, WebhookEnvelope, WebhookJobPayload};
use crate::queue::{self, next_retry_at, webhook_backoff_ms};
use crate::services::webhook_service;
use crate::signer;
use crate::workers::{run_poll_loop, WorkerContext};
use tokio::sync::watch;
use tokio::time::Duration;

/// The deliverer never lets a delivery failure become a worker exception.
/// The queue's own retry policy for `webhook-delivery` is `max_attempts
/// = 1` specifically so this is the only path that ever schedules a
/// retry. A genuine error here (a malformed job, a database outage) is
/// the one case that reaches the queue's `fail()` and is dead-lettered
/// immediately rather than retried.
pub struct WebhookDeliverer {
    ctx: WorkerContext,
}

impl WebhookDeliverer {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) {
        run_poll_loop("webhook-delivery", shutdown_rx, || self.poll_once()).await;
    }

    async fn poll_once(&self) -> Result<(), WorkerError> {
        let Some(lease) = self.ctx.queue.pull_and_lease(queue::WEBHOOK_DELIVERY).await? else {
            return Ok(());
        };

        match self.process(&lease.payload).await {
            Ok(()) => self.ctx.queue.complete(&lease).await?,
            Err(e) => {
                error!(job_id = %lease.job_id, error = %e, "webhook delivery job errored, dead-lettering");
                self.ctx.queue.fail(&lease).await?;
            }
        }

        Ok(())
    }

    async fn process(&self, raw_payload: &serde_json::Value) -> Result<(), WorkerError> {
        let payload: WebhookJobPayload = serde_json::from_value(raw_payload.clone())
            .map_err(|e| WorkerError::BadPayload(e.to_string()))?;

        let (log_id, attempts_before) = match payload.log_id {
            Some(id) => {
                let log = webhook_service::get_log(&self.ctx.pool, id)
                    .await?
                    .ok_or_else(|| WorkerError::JobNotFound(id.to_string()))?;
                (id, log.attempts)
            }
            None => {
                let id = webhook_service::create_log(
                    &self.ctx.pool,
                    payload.merchant_id,
                    &payload.event,
                    &payload.data,
                )
                .await?;
                (id, 0)
            }
        };

        let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
            .bind(payload.merchant_id)
            .fetch_optional(&self.ctx.pool)
            .await?
            .ok_or_else(|| WorkerError::JobNotFound(payload.merchant_id.to_string()))?;

        let Some(webhook_url) = merchant.webhook_url.as_ref() else {
            // No endpoint configured: a deliberate no-op, log untouched.
            return Ok(());
        };

        let envelope = WebhookEnvelope {
            event: payload.event.clone(),
            timestamp: Utc::now().timestamp(),
            data: payload.data.clone(),
        };
        let body_bytes =
            serde_json::to_vec(&envelope).map_err(|e| WorkerError::BadPayload(e.to_string()))?;
        let signature = signer::sign(merchant.webhook_secret.as_bytes(), &body_bytes);

        let response = self
            .ctx
            .http
            .post(webhook_url.as_str())
            .header("Content-Type", "application/json")
            .header("X-Webhook-Signature", signature)
            .timeout(Duration::from_secs(5))
            .body(body_bytes)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let code = resp.status().as_u16() as i32;
                let text = resp.text().await.unwrap_or_default();
                let attempts_after = attempts_before + 1;
                webhook_service::mark_delivered(
                    &self.ctx.pool,
                    log_id,
                    attempts_after,
                    code,
                    &truncate_response_body(&text),
                )
                .await?;
                info!(log_id = %log_id, "webhook delivered");
            }
            Ok(resp) => {
                let code = resp.status().as_u16() as i32;
                let text = resp.text().await.unwrap_or_default();
                self.schedule_retry_or_exhaust(&payload, log_id, attempts_before, code, &text)
                    .await?;
            }
            Err(e) => {
                warn!(log_id = %log_id, error = %e, "webhook delivery transport error");
                self.schedule_retry_or_exhaust(&payload, log_id, attempts_before, 0, &e.to_string())
                    .await?;
            }
        }

        Ok(())
    }

    async fn schedule_retry_or_exhaust(
        &self,
        payload: &WebhookJobPayload,
        log_id: Uuid,
        attempts_before: i32,
        response_code: i32,
        response_body: &str,
    ) -> Result<(), WorkerError> {
        let attempts_after = attempts_before + 1;
        let truncated = truncate_response_body(response_body);
        let use_test_backoff = self.ctx.config.use_test_backoff();

        if attempts_after >= 5 {
            webhook_service::mark_exhausted(
                &self.ctx.pool,
                log_id,
                attempts_after,
                response_code,
                &truncated,
            )
            .await?;
            warn!(log_id = %log_id, "webhook delivery exhausted after 5 attempts");
            return Ok(());
        }

        let next_attempt = attempts_after + 1;
        let retry_at = next_retry_at(use_test_backoff, next_attempt);

        webhook_service::mark_retry_scheduled(
            &self.ctx.pool,
            log_id,
            attempts_after,
            response_code,
            &truncated,
            retry_at,
        )
        .await?;

        let delay_ms = webhook_backoff_ms(use_test_backoff, next_attempt);
        let job_payload = serde_json::to_value(WebhookJobPayload {
            merchant_id: payload.merchant_id,
            event: payload.event.clone(),
            data: payload.data.clone(),
            log_id: Some(log_id),
        })
        .expect("WebhookJobPayload always serializes");

        self.ctx
            .queue
            .enqueue(
                queue::WEBHOOK_DELIVERY,
                &job_payload,
                Some(chrono::Duration::milliseconds(delay_ms)),
            )
            .await?;

        Ok(())
    }
}
