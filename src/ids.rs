use rand::distributions::Alphanumeric;
use rand::Rng;

pub const ORDER_PREFIX: &str = "order_";
pub const PAYMENT_PREFIX: &str = "pay_";
pub const REFUND_PREFIX: &str = "rfnd_";
pub const WEBHOOK_SECRET_PREFIX: &str = "whsec_";

const DEFAULT_BODY_LEN: usize = 16;
const WEBHOOK_SECRET_BODY_LEN: usize = 24;

/// Generates `<prefix><body>` where body is `len` chars sampled uniformly
/// from `[A-Za-z0-9]`. Collisions are astronomically unlikely and are not
/// checked here; callers relying on uniqueness should let the primary key
/// constraint reject a collision rather than pre-checking for one.
fn mint(prefix: &str, len: usize) -> String {
    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect();
    format!("{prefix}{body}")
}

pub fn order_id() -> String {
    mint(ORDER_PREFIX, DEFAULT_BODY_LEN)
}

pub fn payment_id() -> String {
    mint(PAYMENT_PREFIX, DEFAULT_BODY_LEN)
}

pub fn refund_id() -> String {
    mint(REFUND_PREFIX, DEFAULT_BODY_LEN)
}

pub fn webhook_secret() -> String {
    mint(WEBHOOK_SECRET_PREFIX, WEBHOOK_SECRET_BODY_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_right_prefix_and_length() {
        assert!(order_id().starts_with(ORDER_PREFIX));
        assert_eq!(order_id().len(), ORDER_PREFIX.len() + DEFAULT_BODY_LEN);

        assert!(payment_id().starts_with(PAYMENT_PREFIX));
        assert!(refund_id().starts_with(REFUND_PREFIX));

        assert!(webhook_secret().starts_with(WEBHOOK_SECRET_PREFIX));
        assert_eq!(
            webhook_secret().len(),
            WEBHOOK_SECRET_PREFIX.len() + WEBHOOK_SECRET_BODY_LEN
        );
    }

    #[test]
    fn ids_are_alphanumeric_after_the_prefix() {
        let id = payment_id();
        let body = id.strip_prefix(PAYMENT_PREFIX).unwrap();
        assert!(body.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn two_mints_do_not_collide_in_practice() {
        assert_ne!(order_id(), order_id());
    }
}
