use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::ids;
use crate::models::order::{ListResponse, Order};
use crate::models::payment::{
    infer_card_network, last4, CapturePaymentRequest, CreatePaymentRequest, Payment,
    PaymentMethodKind, PaymentStatus,
};
use crate::queue::{self, Queue};
use crate::services::idempotency_service;

/// Method-specific fields resolved from a `CreatePaymentRequest`, ready to
/// bind into the insert. Keeping this as a small struct rather than
/// threading five loose `Option`s through keeps `create` readable.
struct MethodFields {
    method: PaymentMethodKind,
    vpa: Option<String>,
    card_last4: Option<String>,
    card_network: Option<crate::models::payment::CardNetwork>,
}

fn resolve_method_fields(req: &CreatePaymentRequest) -> Result<MethodFields, ApiError> {
    match req.method.as_str() {
        "upi" => {
            let vpa = req
                .vpa
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ApiError::BadRequest("vpa is required for upi payments".into()))?;
            Ok(MethodFields {
                method: PaymentMethodKind::Upi,
                vpa: Some(vpa),
                card_last4: None,
                card_network: None,
            })
        }
        "card" => {
            let card_number = req
                .card_number
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ApiError::BadRequest("card_number is required".into()))?;
            if req.card_expiry.as_deref().unwrap_or("").trim().is_empty() {
                return Err(ApiError::BadRequest("card_expiry is required".into()));
            }
            if req.card_cvv.as_deref().unwrap_or("").trim().is_empty() {
                return Err(ApiError::BadRequest("card_cvv is required".into()));
            }
            Ok(MethodFields {
                method: PaymentMethodKind::Card,
                vpa: None,
                card_last4: Some(last4(&card_number)),
                card_network: Some(infer_card_network(&card_number)),
            })
        }
        other => Err(ApiError::BadRequest(format!(
            "unsupported payment method: {other}"
        ))),
    }
}

/// Payment job payload enqueued on the transactional-outbox path.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PaymentJobPayload {
    pub payment_id: String,
}

/// Creates a payment under optional idempotency protection. Returns the
/// exact JSON body to send back to the client. On a cache hit this is
/// the stored body verbatim, byte-for-byte, regardless of what the
/// current request's fields say.
pub async fn create_payment_with_idempotency(
    pool: &PgPool,
    queue: &Queue,
    merchant_id: Uuid,
    idempotency_key: Option<String>,
    req: &CreatePaymentRequest,
) -> Result<Value, ApiError> {
    if let Some(key) = &idempotency_key {
        if let Some(record) = idempotency_service::get(pool, key, merchant_id).await? {
            return Ok(record.response_body);
        }
    }

    let fields = resolve_method_fields(req)?;

    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE id = $1 AND merchant_id = $2 FOR UPDATE",
    )
    .bind(&req.order_id)
    .bind(merchant_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound("order not found".into()))?;

    let id = ids::payment_id();

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (
            id, merchant_id, order_id, amount, currency, method,
            vpa, card_last4, card_network, status, captured
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', false)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(merchant_id)
    .bind(&order.id)
    .bind(order.amount)
    .bind(&order.currency)
    .bind(fields.method)
    .bind(&fields.vpa)
    .bind(&fields.card_last4)
    .bind(fields.card_network)
    .fetch_one(&mut *tx)
    .await?;

    let job_payload = serde_json::to_value(PaymentJobPayload {
        payment_id: payment.id.clone(),
    })
    .expect("PaymentJobPayload always serializes");

    Queue::enqueue_in_tx(&mut tx, queue::PAYMENT_PROCESSING, &job_payload, None).await?;

    let body = serde_json::to_value(&payment).expect("Payment always serializes");

    if let Some(key) = &idempotency_key {
        let won = idempotency_service::try_put_in_tx(&mut tx, key, merchant_id, 201, &body).await?;
        if !won {
            tx.rollback().await?;
            let record = idempotency_service::get(pool, key, merchant_id)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal("idempotency race lost but no winning record found".into())
                })?;
            return Ok(record.response_body);
        }
    }

    tx.commit().await?;
    Ok(body)
}

pub async fn get_payment(pool: &PgPool, merchant_id: Uuid, id: &str) -> Result<Payment, ApiError> {
    sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 AND merchant_id = $2")
        .bind(id)
        .bind(merchant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("payment not found".into()))
}

pub async fn list_payments(
    pool: &PgPool,
    merchant_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<ListResponse<Payment>, ApiError> {
    let data = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE merchant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(merchant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE merchant_id = $1")
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

/// Only valid when `status=success ∧ captured=false`; capture always
/// covers the full payment amount regardless of the request body.
pub async fn capture_payment(
    pool: &PgPool,
    merchant_id: Uuid,
    id: &str,
    _req: &CapturePaymentRequest,
) -> Result<Payment, ApiError> {
    let payment = get_payment(pool, merchant_id, id).await?;

    if payment.status != PaymentStatus::Success {
        return Err(ApiError::BadRequest(
            "payment must be successful before it can be captured".into(),
        ));
    }
    if payment.captured {
        return Err(ApiError::BadRequest("payment is already captured".into()));
    }

    let updated = sqlx::query_as::<_, Payment>(
        "UPDATE payments SET captured = true, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// `status` transitions only `pending -> success` or `pending -> failed`,
/// never backwards. Called from the payment worker; safe to call twice
/// on the same job because the `WHERE status = 'pending'` guard makes a
/// repeat call on an already-terminal row a no-op.
pub async fn mark_payment_terminal(
    pool: &PgPool,
    id: &str,
    status: PaymentStatus,
    error_code: Option<&str>,
    error_description: Option<&str>,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = $1, error_code = $2, error_description = $3, updated_at = now()
        WHERE id = $4 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(error_code)
    .bind(error_description)
    .bind(id)
    .fetch_optional(pool)
    .await
}
