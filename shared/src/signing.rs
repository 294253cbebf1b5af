//! Payment gateway webhook signing
//!
//! Both sides of the webhook sign the canonical string
//! `transaction_ref|invoice_number|amount|status` with HMAC-SHA256 and
//! exchange the MAC base64-encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Canonical string the gateway signature covers
pub fn canonical_payload(
    transaction_ref: &str,
    invoice_number: &str,
    amount: &Decimal,
    status: &str,
) -> String {
    format!("{}|{}|{}|{}", transaction_ref, invoice_number, amount, status)
}

/// Compute the base64 HMAC-SHA256 signature for a canonical payload
pub fn compute_signature(secret: &str, canonical: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a webhook signature
pub fn verify_signature(secret: &str, canonical: &str, signature: &str) -> bool {
    let Ok(provided) = BASE64.decode(signature) else {
        return false;
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(canonical.as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let canonical = canonical_payload(
            "TXN-001",
            "INV-2026-000001",
            &Decimal::new(535000, 2),
            "success",
        );
        assert_eq!(canonical, "TXN-001|INV-2026-000001|5350.00|success");

        let sig = compute_signature("secret", &canonical);
        assert!(verify_signature("secret", &canonical, &sig));
    }

    #[test]
    fn test_signature_rejects_wrong_secret() {
        let canonical = "TXN-001|INV-2026-000001|5350.00|success";
        let sig = compute_signature("secret-a", canonical);
        assert!(!verify_signature("secret-b", canonical, &sig));
    }

    #[test]
    fn test_signature_rejects_garbage_base64() {
        assert!(!verify_signature("secret", "payload", "not base64!!!"));
    }
}
