//! Exercises the signer + envelope contract as a merchant-side receiver
//! would: reconstruct the exact transmitted bytes and verify the
//! signature header against them.

use paygate_backend::models::webhook::WebhookEnvelope;
use paygate_backend::signer;
use serde_json::json;

#[test]
fn signature_verifies_against_the_exact_serialized_bytes() {
    let secret = b"whsec_test_secret";
    let envelope = WebhookEnvelope {
        event: "payment.success".to_string(),
        timestamp: 1_700_000_000,
        data: json!({ "payment": { "id": "pay_abc123", "amount": 5000 } }),
    };

    let body = serde_json::to_vec(&envelope).unwrap();
    let signature = signer::sign(secret, &body);

    assert!(signer::verify(secret, &body, &signature));
}

#[test]
fn re_serializing_the_envelope_does_not_necessarily_preserve_the_signature() {
    // Field order and whitespace are not guaranteed across independent
    // serializations, which is exactly why the deliverer signs the
    // literal bytes it is about to send rather than re-deriving them from
    // the stored struct.
    let secret = b"whsec_test_secret";
    let envelope = WebhookEnvelope {
        event: "payment.failed".to_string(),
        timestamp: 1_700_000_000,
        data: json!({ "payment": { "id": "pay_xyz" } }),
    };

    let body = serde_json::to_vec(&envelope).unwrap();
    let signature = signer::sign(secret, &body);

    let mut tampered = body.clone();
    let last = tampered.len() - 1;
    tampered.insert(last, b' ');

    assert!(!signer::verify(secret, &tampered, &signature));
}
