use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Merchant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub webhook_url: Option<String>,
    #[serde(skip_serializing)]
    pub webhook_secret: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What `GET /api/v1/merchants/profile` actually returns; secrets never
/// leave the process.
#[derive(Debug, Serialize)]
pub struct MerchantProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Merchant> for MerchantProfile {
    fn from(m: Merchant) -> Self {
        MerchantProfile {
            id: m.id,
            name: m.name,
            email: m.email,
            webhook_url: m.webhook_url,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub webhook_url: String,
}

#[derive(Debug, Serialize)]
pub struct RegenerateSecretResponse {
    pub webhook_secret: String,
}
