use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedMerchant;
use crate::models::order::{normalize_pagination, PaginationQuery};
use crate::models::refund::CreateRefundRequest;
use crate::services::refund_service;
use crate::AppState;

pub async fn create_refund(
    merchant: AuthenticatedMerchant,
    path: web::Path<String>,
    body: web::Json<CreateRefundRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let refund = refund_service::create_refund(
        &state.db.pool,
        &state.queue,
        merchant.0.id,
        &path,
        &body,
    )
    .await?;

    Ok(HttpResponse::Created().json(refund))
}

pub async fn get_refund(
    merchant: AuthenticatedMerchant,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let refund = refund_service::get_refund(&state.db.pool, merchant.0.id, &path).await?;
    Ok(HttpResponse::Ok().json(refund))
}

pub async fn list_refunds(
    merchant: AuthenticatedMerchant,
    query: web::Query<PaginationQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = normalize_pagination(&query);
    let list = refund_service::list_refunds(&state.db.pool, merchant.0.id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(list))
}
