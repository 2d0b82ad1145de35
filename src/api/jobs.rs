use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::errors::ApiError;
use crate::queue::{self, QueueCounts};
use crate::AppState;

#[derive(Debug, Serialize)]
struct JobStatusResponse {
    #[serde(rename = "payment-processing")]
    payment_processing: QueueCounts,
    #[serde(rename = "refund-processing")]
    refund_processing: QueueCounts,
    #[serde(rename = "webhook-delivery")]
    webhook_delivery: QueueCounts,
}

/// Unauthenticated: a lightweight operational endpoint, not merchant
/// scoped data.
pub async fn status(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let response = JobStatusResponse {
        payment_processing: state.queue.counts(queue::PAYMENT_PROCESSING).await?,
        refund_processing: state.queue.counts(queue::REFUND_PROCESSING).await?,
        webhook_delivery: state.queue.counts(queue::WEBHOOK_DELIVERY).await?,
    };

    Ok(HttpResponse::Ok().json(response))
}
