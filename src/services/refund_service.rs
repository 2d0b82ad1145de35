use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::ids;
use crate::models::order::ListResponse;
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::refund::{CreateRefundRequest, Refund};
use crate::queue::{self, Queue};

#[derive(serde::Serialize, serde::Deserialize)]
pub struct RefundJobPayload {
    pub refund_id: String,
}

/// Available amount is computed under a row lock on the parent payment so
/// two concurrent refund requests against the same payment cannot both
/// observe the same available balance.
pub async fn create_refund(
    pool: &PgPool,
    queue: &Queue,
    merchant_id: Uuid,
    payment_id: &str,
    req: &CreateRefundRequest,
) -> Result<Refund, ApiError> {
    let mut tx = pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE id = $1 AND merchant_id = $2 FOR UPDATE",
    )
    .bind(payment_id)
    .bind(merchant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("payment not found".into()))?;

    if payment.status != PaymentStatus::Success {
        return Err(ApiError::BadRequest(
            "refunds are only allowed on successful payments".into(),
        ));
    }

    let refunded: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM refunds WHERE payment_id = $1")
            .bind(payment_id)
            .fetch_one(&mut *tx)
            .await?;

    let available = payment.amount - refunded;
    if req.amount > available {
        return Err(ApiError::BadRequest(format!(
            "refund amount {} exceeds available amount {available}",
            req.amount
        )));
    }

    let id = ids::refund_id();

    let refund = sqlx::query_as::<_, Refund>(
        r#"
        INSERT INTO refunds (id, payment_id, merchant_id, amount, reason, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(payment_id)
    .bind(merchant_id)
    .bind(req.amount)
    .bind(&req.reason)
    .fetch_one(&mut *tx)
    .await?;

    let job_payload = serde_json::to_value(RefundJobPayload {
        refund_id: refund.id.clone(),
    })
    .expect("RefundJobPayload always serializes");

    Queue::enqueue_in_tx(&mut tx, queue::REFUND_PROCESSING, &job_payload, None).await?;

    tx.commit().await?;
    Ok(refund)
}

pub async fn get_refund(pool: &PgPool, merchant_id: Uuid, id: &str) -> Result<Refund, ApiError> {
    sqlx::query_as::<_, Refund>("SELECT * FROM refunds WHERE id = $1 AND merchant_id = $2")
        .bind(id)
        .bind(merchant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("refund not found".into()))
}

pub async fn list_refunds(
    pool: &PgPool,
    merchant_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<ListResponse<Refund>, ApiError> {
    let data = sqlx::query_as::<_, Refund>(
        "SELECT * FROM refunds WHERE merchant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(merchant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refunds WHERE merchant_id = $1")
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

/// `status` transitions only `pending -> processed`; the `WHERE status =
/// 'pending'` guard makes a repeat call from a queue retry a no-op.
pub async fn mark_refund_processed(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Refund>, sqlx::Error> {
    sqlx::query_as::<_, Refund>(
        r#"
        UPDATE refunds
        SET status = 'processed', processed_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
