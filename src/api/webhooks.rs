use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middleware::AuthenticatedMerchant;
use crate::models::order::{normalize_pagination, PaginationQuery};
use crate::services::webhook_service;
use crate::AppState;

pub async fn list_webhooks(
    merchant: AuthenticatedMerchant,
    query: web::Query<PaginationQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = normalize_pagination(&query);
    let list =
        webhook_service::list_logs(&state.db.pool, merchant.0.id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(list))
}

pub async fn retry_webhook(
    merchant: AuthenticatedMerchant,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    webhook_service::retry(&state.db.pool, &state.queue, merchant.0.id, *path).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "retry_scheduled" })))
}
