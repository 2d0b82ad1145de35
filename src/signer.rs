use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 over `payload`, keyed by `secret`. `payload`
/// must be the exact bytes transmitted on the wire; signer and HTTP body
/// have to agree byte-for-byte for merchants to verify it.
pub fn sign(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Timing-safe verification: recomputes the MAC and compares it to the
/// decoded signature using the `hmac` crate's constant-time `verify_slice`.
pub fn verify(secret: &[u8], payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_is_lowercase_hex() {
        let sig = sign(b"secret", b"{\"a\":1}");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn verify_accepts_a_matching_signature() {
        let sig = sign(b"whsec_abc", b"payload-bytes");
        assert!(verify(b"whsec_abc", b"payload-bytes", &sig));
    }

    #[test]
    fn verify_rejects_any_single_byte_change() {
        let payload = b"{\"event\":\"payment.success\"}".to_vec();
        let sig = sign(b"whsec_abc", &payload);

        let mut mutated = payload.clone();
        mutated[5] ^= 0x01;
        assert!(!verify(b"whsec_abc", &mutated, &sig));
    }

    #[test]
    fn verify_rejects_the_wrong_secret() {
        let sig = sign(b"whsec_abc", b"payload-bytes");
        assert!(!verify(b"whsec_xyz", b"payload-bytes", &sig));
    }

    #[test]
    fn verify_rejects_malformed_hex() {
        assert!(!verify(b"whsec_abc", b"payload-bytes", "not-hex"));
    }
}
