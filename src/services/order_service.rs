use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::ids;
use crate::models::order::{CreateOrderRequest, ListResponse, Order};

pub async fn create_order(
    pool: &PgPool,
    merchant_id: Uuid,
    req: &CreateOrderRequest,
) -> Result<Order, ApiError> {
    let id = ids::order_id();
    let currency = req.currency.clone().unwrap_or_else(|| "INR".to_string());

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, merchant_id, amount, currency, receipt)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(merchant_id)
    .bind(req.amount)
    .bind(&currency)
    .bind(&req.receipt)
    .fetch_one(pool)
    .await?;

    Ok(order)
}

pub async fn get_order(pool: &PgPool, merchant_id: Uuid, id: &str) -> Result<Order, ApiError> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND merchant_id = $2")
        .bind(id)
        .bind(merchant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".into()))
}

pub async fn list_orders(
    pool: &PgPool,
    merchant_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<ListResponse<Order>, ApiError> {
    let data = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE merchant_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(merchant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE merchant_id = $1")
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
