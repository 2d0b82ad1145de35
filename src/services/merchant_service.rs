use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::ids;
use crate::models::merchant::{Merchant, MerchantProfile, RegenerateSecretResponse};
use crate::queue::Queue;
use crate::services::webhook_service;

pub async fn get_profile(pool: &PgPool, merchant_id: Uuid) -> Result<MerchantProfile, ApiError> {
    let merchant = sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
        .bind(merchant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("merchant not found".into()))?;

    Ok(merchant.into())
}

pub async fn update_webhook_url(
    pool: &PgPool,
    merchant_id: Uuid,
    webhook_url: &str,
) -> Result<MerchantProfile, ApiError> {
    let merchant = sqlx::query_as::<_, Merchant>(
        "UPDATE merchants SET webhook_url = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(webhook_url)
    .bind(merchant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("merchant not found".into()))?;

    Ok(merchant.into())
}

pub async fn regenerate_webhook_secret(
    pool: &PgPool,
    merchant_id: Uuid,
) -> Result<RegenerateSecretResponse, ApiError> {
    let secret = ids::webhook_secret();

    let row = sqlx::query_scalar::<_, String>(
        "UPDATE merchants SET webhook_secret = $1, updated_at = now() WHERE id = $2 RETURNING webhook_secret",
    )
    .bind(&secret)
    .bind(merchant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound("merchant not found".into()))?;

    Ok(RegenerateSecretResponse {
        webhook_secret: row,
    })
}

/// Enqueues a synthetic `test.webhook` event so a merchant can verify
/// their endpoint and signature handling without a real transaction.
pub async fn send_test_webhook(
    pool: &PgPool,
    queue: &Queue,
    merchant_id: Uuid,
) -> Result<(), ApiError> {
    sqlx::query_as::<_, Merchant>("SELECT * FROM merchants WHERE id = $1")
        .bind(merchant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("merchant not found".into()))?;

    webhook_service::enqueue_event(
        queue,
        merchant_id,
        "test.webhook",
        json!({ "message": "This is a test webhook" }),
    )
    .await?;

    Ok(())
}
