use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::order::ListResponse;
use crate::models::payment::Payment;
use crate::models::refund::Refund;
use crate::models::webhook::{WebhookJobPayload, WebhookLog};
use crate::queue::{self, Queue};

/// The `data.payment` shape for `payment.success` / `payment.failed`
/// events, per the wire contract in §6. Optional fields that don't apply
/// to this payment serialize as JSON `null` rather than being omitted.
pub fn payment_webhook_data(payment: &Payment) -> Value {
    json!({
        "payment": {
            "id": payment.id,
            "order_id": payment.order_id,
            "amount": payment.amount,
            "currency": payment.currency,
            "method": payment.method,
            "vpa": payment.vpa,
            "status": payment.status,
            "error_code": payment.error_code,
            "error_description": payment.error_description,
            "created_at": payment.created_at,
        }
    })
}

/// The `data.refund` shape for `refund.processed`.
pub fn refund_webhook_data(refund: &Refund) -> Value {
    json!({
        "refund": {
            "id": refund.id,
            "payment_id": refund.payment_id,
            "amount": refund.amount,
            "reason": refund.reason,
            "status": refund.status,
            "created_at": refund.created_at,
            "processed_at": refund.processed_at,
        }
    })
}

/// Enqueues a fan-out for a brand-new event. The worker creates the
/// `webhook_logs` row itself on first delivery (the job carries no
/// `log_id` yet), see `workers::webhook_deliverer`. Every call site
/// (payment worker, refund worker, merchant test-webhook) runs after its
/// own business transaction has already committed, so this always
/// enqueues standalone rather than inside a caller-owned transaction.
pub async fn enqueue_event(
    queue: &Queue,
    merchant_id: Uuid,
    event: &str,
    data: Value,
) -> Result<Uuid, sqlx::Error> {
    let payload = serde_json::to_value(WebhookJobPayload {
        merchant_id,
        event: event.to_string(),
        data,
        log_id: None,
    })
    .expect("WebhookJobPayload always serializes");

    queue.enqueue(crate::queue::WEBHOOK_DELIVERY, &payload, None).await
}

pub async fn create_log(
    pool: &PgPool,
    merchant_id: Uuid,
    event: &str,
    payload: &Value,
) -> Result<Uuid, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO webhook_logs (merchant_id, event, payload, status, attempts)
        VALUES ($1, $2, $3, 'pending', 0)
        RETURNING id
        "#,
    )
    .bind(merchant_id)
    .bind(event)
    .bind(payload)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn get_log(pool: &PgPool, id: Uuid) -> Result<Option<WebhookLog>, sqlx::Error> {
    sqlx::query_as::<_, WebhookLog>("SELECT * FROM webhook_logs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn mark_delivered(
    pool: &PgPool,
    id: Uuid,
    attempts: i32,
    response_code: i32,
    response_body: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE webhook_logs
        SET status = 'success', attempts = $1, last_attempt_at = $2,
            next_retry_at = NULL, response_code = $3, response_body = $4
        WHERE id = $5
        "#,
    )
    .bind(attempts)
    .bind(Utc::now())
    .bind(response_code)
    .bind(response_body)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_retry_scheduled(
    pool: &PgPool,
    id: Uuid,
    attempts: i32,
    response_code: i32,
    response_body: &str,
    next_retry_at: chrono::DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE webhook_logs
        SET status = 'pending', attempts = $1, last_attempt_at = $2,
            next_retry_at = $3, response_code = $4, response_body = $5
        WHERE id = $6
        "#,
    )
    .bind(attempts)
    .bind(Utc::now())
    .bind(next_retry_at)
    .bind(response_code)
    .bind(response_body)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_exhausted(
    pool: &PgPool,
    id: Uuid,
    attempts: i32,
    response_code: i32,
    response_body: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE webhook_logs
        SET status = 'failed', attempts = $1, last_attempt_at = $2,
            next_retry_at = NULL, response_code = $3, response_body = $4
        WHERE id = $5
        "#,
    )
    .bind(attempts)
    .bind(Utc::now())
    .bind(response_code)
    .bind(response_body)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_logs(
    pool: &PgPool,
    merchant_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<ListResponse<WebhookLog>, sqlx::Error> {
    let data = sqlx::query_as::<_, WebhookLog>(
        "SELECT * FROM webhook_logs WHERE merchant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(merchant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_logs WHERE merchant_id = $1")
        .bind(merchant_id)
        .fetch_one(pool)
        .await?;

    Ok(ListResponse {
        data,
        total,
        limit,
        offset,
    })
}

/// Resets the schedule and re-enqueues with zero delay: a fresh
/// schedule, not a continuation of the old one, per spec.
pub async fn retry(pool: &PgPool, queue: &Queue, merchant_id: Uuid, id: Uuid) -> Result<(), ApiError> {
    let log = sqlx::query_as::<_, WebhookLog>(
        "SELECT * FROM webhook_logs WHERE id = $1 AND merchant_id = $2",
    )
    .bind(id)
    .bind(merchant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("webhook log not found".into()))?;

    sqlx::query(
        "UPDATE webhook_logs SET status = 'pending', attempts = 0, next_retry_at = NULL WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    let payload = serde_json::to_value(WebhookJobPayload {
        merchant_id,
        event: log.event.clone(),
        data: log.payload.clone(),
        log_id: Some(id),
    })
    .expect("WebhookJobPayload always serializes");

    queue
        .enqueue(crate::queue::WEBHOOK_DELIVERY, &payload, None)
        .await?;

    Ok(())
}
