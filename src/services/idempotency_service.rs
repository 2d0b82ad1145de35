//! Read-before-create / write-after-create idempotency, keyed on
//! `(key, merchant_id)`. The unique primary key on `idempotency_records`
//! is the sole source of correctness for the concurrent-duplicate case,
//! see `payment_service::create_payment_with_idempotency`, which relies
//! on `ON CONFLICT DO NOTHING` here rather than an advisory lock.

use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::idempotency::{IdempotencyRecord, IDEMPOTENCY_TTL_HOURS};

/// Returns the cached record if present and not expired. A found-but-
/// expired record is deleted as part of the read, matching the spec's
/// "expired records are deleted on read-miss".
pub async fn get(
    pool: &PgPool,
    key: &str,
    merchant_id: Uuid,
) -> Result<Option<IdempotencyRecord>, sqlx::Error> {
    let record = sqlx::query_as::<_, IdempotencyRecord>(
        "SELECT * FROM idempotency_records WHERE key = $1 AND merchant_id = $2",
    )
    .bind(key)
    .bind(merchant_id)
    .fetch_optional(pool)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    if record.expires_at <= Utc::now() {
        sqlx::query("DELETE FROM idempotency_records WHERE key = $1 AND merchant_id = $2")
            .bind(key)
            .bind(merchant_id)
            .execute(pool)
            .await?;
        return Ok(None);
    }

    Ok(Some(record))
}

/// Attempts to record a response for `key`. Returns `true` if this call
/// won the race and inserted the row, `false` if a concurrent request
/// already holds it (the caller must then discard its own work and read
/// back the winner's record).
pub async fn try_put_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    key: &str,
    merchant_id: Uuid,
    response_status: i32,
    response_body: &Value,
) -> Result<bool, sqlx::Error> {
    let expires_at = Utc::now() + Duration::hours(IDEMPOTENCY_TTL_HOURS);

    let result = sqlx::query(
        r#"
        INSERT INTO idempotency_records (key, merchant_id, response_status, response_body, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (key, merchant_id) DO NOTHING
        "#,
    )
    .bind(key)
    .bind(merchant_id)
    .bind(response_status)
    .bind(response_body)
    .bind(expires_at)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn delete(pool: &PgPool, key: &str, merchant_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM idempotency_records WHERE key = $1 AND merchant_id = $2")
        .bind(key)
        .bind(merchant_id)
        .execute(pool)
        .await?;
    Ok(())
}
