use actix_web::{web, HttpRequest, HttpResponse};
use tracing::info;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedMerchant;
use crate::models::idempotency::normalize_idempotency_key;
use crate::models::order::{normalize_pagination, PaginationQuery};
use crate::models::payment::{CapturePaymentRequest, CreatePaymentRequest};
use crate::services::payment_service;
use crate::AppState;

pub async fn create_payment(
    req: HttpRequest,
    merchant: AuthenticatedMerchant,
    body: web::Json<CreatePaymentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let idempotency_key = normalize_idempotency_key(
        req.headers()
            .get("Idempotency-Key")
            .and_then(|h| h.to_str().ok()),
    );

    let body = payment_service::create_payment_with_idempotency(
        &state.db.pool,
        &state.queue,
        merchant.0.id,
        idempotency_key,
        &body,
    )
    .await?;

    info!(merchant_id = %merchant.0.id, "payment created");
    Ok(HttpResponse::Created().json(body))
}

pub async fn get_payment(
    merchant: AuthenticatedMerchant,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let payment = payment_service::get_payment(&state.db.pool, merchant.0.id, &path).await?;
    Ok(HttpResponse::Ok().json(payment))
}

pub async fn list_payments(
    merchant: AuthenticatedMerchant,
    query: web::Query<PaginationQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = normalize_pagination(&query);
    let list = payment_service::list_payments(&state.db.pool, merchant.0.id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn capture_payment(
    merchant: AuthenticatedMerchant,
    path: web::Path<String>,
    body: web::Json<CapturePaymentRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let payment =
        payment_service::capture_payment(&state.db.pool, merchant.0.id, &path, &body).await?;
    Ok(HttpResponse::Ok().json(payment))
}
