pub mod health;
pub mod jobs;
pub mod merchants;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod webhooks;

use actix_web::web;

/// Route table for the `paygate-api` binary. Auth is per-handler via the
/// `AuthenticatedMerchant` extractor, not a scope-level `.wrap(...)`,
/// since `/api/v1/test/jobs/status` sits inside the same `/api/v1` scope
/// but must stay unauthenticated.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(actix_web::web::resource("/health").route(web::get().to(health::health)))
        .service(
            web::scope("/api/v1")
                .route("/orders", web::post().to(orders::create_order))
                .route("/orders/{id}", web::get().to(orders::get_order))
                .route("/orders", web::get().to(orders::list_orders))
                .route("/payments", web::post().to(payments::create_payment))
                .route("/payments/{id}", web::get().to(payments::get_payment))
                .route("/payments", web::get().to(payments::list_payments))
                .route(
                    "/payments/{id}/capture",
                    web::post().to(payments::capture_payment),
                )
                .route(
                    "/payments/{id}/refunds",
                    web::post().to(refunds::create_refund),
                )
                .route("/refunds/{id}", web::get().to(refunds::get_refund))
                .route("/refunds", web::get().to(refunds::list_refunds))
                .route("/webhooks", web::get().to(webhooks::list_webhooks))
                .route(
                    "/webhooks/{id}/retry",
                    web::post().to(webhooks::retry_webhook),
                )
                .route("/merchants/profile", web::get().to(merchants::get_profile))
                .route(
                    "/merchants/webhook",
                    web::put().to(merchants::update_webhook),
                )
                .route(
                    "/merchants/webhook/regenerate-secret",
                    web::post().to(merchants::regenerate_secret),
                )
                .route(
                    "/merchants/webhook/test",
                    web::post().to(merchants::send_test_webhook),
                )
                .route("/test/jobs/status", web::get().to(jobs::status)),
        );
}
