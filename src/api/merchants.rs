use actix_web::{web, HttpResponse};

use crate::errors::ApiError;
use crate::middleware::AuthenticatedMerchant;
use crate::models::merchant::UpdateWebhookRequest;
use crate::services::merchant_service;
use crate::AppState;

pub async fn get_profile(
    merchant: AuthenticatedMerchant,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let profile = merchant_service::get_profile(&state.db.pool, merchant.0.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_webhook(
    merchant: AuthenticatedMerchant,
    body: web::Json<UpdateWebhookRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let profile =
        merchant_service::update_webhook_url(&state.db.pool, merchant.0.id, &body.webhook_url)
            .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn regenerate_secret(
    merchant: AuthenticatedMerchant,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let response =
        merchant_service::regenerate_webhook_secret(&state.db.pool, merchant.0.id).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn send_test_webhook(
    merchant: AuthenticatedMerchant,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    merchant_service::send_test_webhook(&state.db.pool, &state.queue, merchant.0.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "queued" })))
}
