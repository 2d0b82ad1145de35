use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const IDEMPOTENCY_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdempotencyRecord {
    pub key: String,
    pub merchant_id: Uuid,
    pub response_status: i32,
    pub response_body: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Empty-string idempotency keys are treated as absent.
pub fn normalize_idempotency_key(header: Option<&str>) -> Option<String> {
    header
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_absent() {
        assert_eq!(normalize_idempotency_key(None), None);
    }

    #[test]
    fn empty_string_header_is_absent() {
        assert_eq!(normalize_idempotency_key(Some("")), None);
        assert_eq!(normalize_idempotency_key(Some("   ")), None);
    }

    #[test]
    fn a_real_key_passes_through() {
        assert_eq!(
            normalize_idempotency_key(Some("k1")),
            Some("k1".to_string())
        );
    }
}
