use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Upi,
    Card,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "card_network", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Unknown,
}

/// Card PAN prefix rules: `4` -> visa, `5` -> mastercard, else unknown.
/// Only last-4 and this inferred tag are ever persisted.
pub fn infer_card_network(card_number: &str) -> CardNetwork {
    match card_number.chars().next() {
        Some('4') => CardNetwork::Visa,
        Some('5') => CardNetwork::Mastercard,
        _ => CardNetwork::Unknown,
    }
}

pub fn last4(card_number: &str) -> String {
    let digits: String = card_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 {
        digits[digits.len() - 4..].to_string()
    } else {
        digits
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub merchant_id: Uuid,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethodKind,
    pub vpa: Option<String>,
    pub card_last4: Option<String>,
    pub card_network: Option<CardNetwork>,
    pub status: PaymentStatus,
    pub captured: bool,
    pub error_code: Option<String>,
    pub error_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub method: String,
    pub vpa: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
    pub card_cvv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CapturePaymentRequest {
    /// Ignored in this core: capture always covers the full payment
    /// amount. Accepted for wire compatibility only.
    #[allow(dead_code)]
    pub amount: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_starting_with_4_is_visa() {
        assert_eq!(infer_card_network("4111111111111111"), CardNetwork::Visa);
    }

    #[test]
    fn pan_starting_with_5_is_mastercard() {
        assert_eq!(infer_card_network("5555555555554444"), CardNetwork::Mastercard);
    }

    #[test]
    fn pan_starting_with_anything_else_is_unknown() {
        assert_eq!(infer_card_network("6011111111111117"), CardNetwork::Unknown);
        assert_eq!(infer_card_network(""), CardNetwork::Unknown);
    }

    #[test]
    fn last4_takes_the_final_four_digits() {
        assert_eq!(last4("4111111111111111"), "1111");
    }

    #[test]
    fn last4_handles_short_input_without_panicking() {
        assert_eq!(last4("12"), "12");
    }
}
