use actix_web::{web, HttpResponse};
use tracing::info;
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedMerchant;
use crate::models::order::{normalize_pagination, CreateOrderRequest, PaginationQuery};
use crate::services::order_service;
use crate::AppState;

pub async fn create_order(
    merchant: AuthenticatedMerchant,
    body: web::Json<CreateOrderRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let order = order_service::create_order(&state.db.pool, merchant.0.id, &body).await?;
    info!(order_id = %order.id, merchant_id = %merchant.0.id, "order created");

    Ok(HttpResponse::Created().json(order))
}

pub async fn get_order(
    merchant: AuthenticatedMerchant,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let order = order_service::get_order(&state.db.pool, merchant.0.id, &path).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn list_orders(
    merchant: AuthenticatedMerchant,
    query: web::Query<PaginationQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = normalize_pagination(&query);
    let list = order_service::list_orders(&state.db.pool, merchant.0.id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(list))
}
