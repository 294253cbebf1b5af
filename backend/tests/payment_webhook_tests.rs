//! Payment webhook signature tests
//!
//! Tests for the gateway signing contract: HMAC-SHA256 over the canonical
//! string `transaction_ref|invoice_number|amount|status`, base64-encoded.
//! These exercise the same functions the webhook handler verifies with.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::signing::{canonical_payload, compute_signature, verify_signature};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Pipe-joined field order is part of the contract
    #[test]
    fn test_canonical_payload_format() {
        let canonical = canonical_payload(
            "TXN-001",
            "INV-2026-000001",
            &Decimal::new(535000, 2),
            "success",
        );
        assert_eq!(canonical, "TXN-001|INV-2026-000001|5350.00|success");
    }

    /// Decimal formatting preserves the scale the gateway sent
    #[test]
    fn test_canonical_payload_amount_scale() {
        let whole = canonical_payload("T", "I", &Decimal::from(5350), "success");
        assert_eq!(whole, "T|I|5350|success");

        let satang = canonical_payload("T", "I", &Decimal::new(535000, 2), "success");
        assert_eq!(satang, "T|I|5350.00|success");
    }

    #[test]
    fn test_signature_round_trip() {
        let canonical = "TXN-001|INV-2026-000001|5350.00|success";
        let signature = compute_signature("webhook-secret", canonical);
        assert!(verify_signature("webhook-secret", canonical, &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let canonical = "TXN-001|INV-2026-000001|5350.00|success";
        let signature = compute_signature("webhook-secret", canonical);
        assert!(!verify_signature("other-secret", canonical, &signature));
    }

    #[test]
    fn test_garbage_signature_fails() {
        let canonical = "TXN-001|INV-2026-000001|5350.00|success";
        assert!(!verify_signature("webhook-secret", canonical, "not base64 !!!"));
        assert!(!verify_signature("webhook-secret", canonical, ""));
        // Valid base64 of the wrong bytes
        assert!(!verify_signature("webhook-secret", canonical, &BASE64.encode(b"wrong")));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn ref_strategy() -> impl Strategy<Value = String> {
    "[A-Z0-9-]{4,24}"
}

proptest! {
    /// Signing is deterministic and verification accepts its own output
    #[test]
    fn test_sign_verify_round_trip(
        secret in "[a-zA-Z0-9]{8,32}",
        transaction_ref in ref_strategy(),
        invoice_number in ref_strategy(),
        satang in 1i64..100_000_000,
        success in any::<bool>(),
    ) {
        let amount = Decimal::new(satang, 2);
        let status = if success { "success" } else { "failed" };
        let canonical = canonical_payload(&transaction_ref, &invoice_number, &amount, status);

        let signature = compute_signature(&secret, &canonical);
        prop_assert_eq!(&signature, &compute_signature(&secret, &canonical));
        prop_assert!(verify_signature(&secret, &canonical, &signature));
    }

    /// Tampering with any field invalidates the signature
    #[test]
    fn test_tampered_payload_fails(
        secret in "[a-zA-Z0-9]{8,32}",
        transaction_ref in ref_strategy(),
        invoice_number in ref_strategy(),
        satang in 1i64..100_000_000,
    ) {
        let amount = Decimal::new(satang, 2);
        let canonical = canonical_payload(&transaction_ref, &invoice_number, &amount, "success");
        let signature = compute_signature(&secret, &canonical);

        // Flip the amount by one satang
        let tampered_amount = Decimal::new(satang + 1, 2);
        let tampered = canonical_payload(&transaction_ref, &invoice_number, &tampered_amount, "success");
        prop_assert!(!verify_signature(&secret, &tampered, &signature));

        // Flip the status
        let tampered = canonical_payload(&transaction_ref, &invoice_number, &amount, "failed");
        prop_assert!(!verify_signature(&secret, &tampered, &signature));
    }

    /// Signatures are valid base64 of a 32-byte MAC
    #[test]
    fn test_signature_shape(
        secret in "[a-zA-Z0-9]{8,32}",
        canonical in ".{0,64}",
    ) {
        let signature = compute_signature(&secret, &canonical);
        let decoded = BASE64.decode(&signature).unwrap();
        prop_assert_eq!(decoded.len(), 32);
    }
}
