use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "webhook_log_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebhookLogStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookLog {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub event: String,
    pub payload: serde_json::Value,
    pub status: WebhookLogStatus,
    pub attempts: i32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub response_code: Option<i32>,
    pub response_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The exact wire shape signed and transmitted to a merchant endpoint.
/// Serialized exactly once per delivery attempt; the resulting bytes are
/// both the HTTP body and the signer's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub timestamp: i64,
    pub data: serde_json::Value,
}

pub const MAX_RESPONSE_BODY_BYTES: usize = 1000;

pub fn truncate_response_body(body: &str) -> String {
    if body.len() <= MAX_RESPONSE_BODY_BYTES {
        body.to_string()
    } else {
        // Truncate on a char boundary so we never split a multi-byte UTF-8
        // sequence.
        let mut end = MAX_RESPONSE_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body[..end].to_string()
    }
}

/// Payload carried by a `webhook-delivery` job. `log_id` is `None` on the
/// initial fan-out from a worker and `Some` on every manual or automatic
/// retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookJobPayload {
    pub merchant_id: Uuid,
    pub event: String,
    pub data: serde_json::Value,
    pub log_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_untouched() {
        assert_eq!(truncate_response_body("ok"), "ok");
    }

    #[test]
    fn long_body_is_truncated_to_the_limit() {
        let body = "x".repeat(2000);
        assert_eq!(truncate_response_body(&body).len(), MAX_RESPONSE_BODY_BYTES);
    }

    #[test]
    fn truncation_never_splits_a_utf8_boundary() {
        let body = "é".repeat(MAX_RESPONSE_BODY_BYTES);
        let truncated = truncate_response_body(&body);
        assert!(truncated.len() <= MAX_RESPONSE_BODY_BYTES);
        assert!(String::from_utf8(truncated.into_bytes()).is_ok());
    }
}
