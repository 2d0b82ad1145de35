use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: String,
    pub merchant_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(range(min = 1, message = "amount must be greater than zero"))]
    pub amount: i64,
    pub currency: Option<String>,
    pub receipt: Option<String>,
}

/// `limit`/`offset` are taken as raw strings rather than `Option<i64>` so
/// a non-numeric value fails to parse instead of failing `web::Query`'s
/// own deserialization, which would otherwise return a bare 400 outside
/// the `{error:{code,description}}` envelope.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_OFFSET: i64 = 0;

/// Negative or non-numeric pagination values fall back to the defaults.
pub fn normalize_pagination(q: &PaginationQuery) -> (i64, i64) {
    let limit = parse_non_negative(q.limit.as_deref()).unwrap_or(DEFAULT_LIMIT);
    let offset = parse_non_negative(q.offset.as_deref()).unwrap_or(DEFAULT_OFFSET);
    (limit, offset)
}

fn parse_non_negative(raw: Option<&str>) -> Option<i64> {
    raw?.parse::<i64>().ok().filter(|v| *v >= 0)
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_pagination_falls_back_to_defaults() {
        let q = PaginationQuery {
            limit: Some("-5".to_string()),
            offset: Some("-1".to_string()),
        };
        assert_eq!(normalize_pagination(&q), (DEFAULT_LIMIT, DEFAULT_OFFSET));
    }

    #[test]
    fn non_numeric_pagination_falls_back_to_defaults() {
        let q = PaginationQuery {
            limit: Some("abc".to_string()),
            offset: Some("12.5".to_string()),
        };
        assert_eq!(normalize_pagination(&q), (DEFAULT_LIMIT, DEFAULT_OFFSET));
    }

    #[test]
    fn absent_pagination_uses_defaults() {
        let q = PaginationQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(normalize_pagination(&q), (DEFAULT_LIMIT, DEFAULT_OFFSET));
    }

    #[test]
    fn valid_pagination_passes_through() {
        let q = PaginationQuery {
            limit: Some("25".to_string()),
            offset: Some("50".to_string()),
        };
        assert_eq!(normalize_pagination(&q), (25, 50));
    }
}
