pub mod idempotency_service;
pub mod merchant_service;
pub mod order_service;
pub mod payment_service;
pub mod refund_service;
pub mod webhook_service;
