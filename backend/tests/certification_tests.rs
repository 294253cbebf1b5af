//! Certificate and traceability asset tests
//!
//! Tests for document numbering and the provenance chain formats:
//! - Buddhist-era certificate numbers
//! - Application and batch number formats
//! - Verification and tracking URLs

use proptest::prelude::*;

use shared::models::{
    format_application_number, format_batch_number, format_certificate_number, tracking_url,
    verification_url, CERTIFICATE_VALIDITY_YEARS,
};
use shared::types::buddhist_year;
use shared::validation::{validate_application_number, validate_certificate_number};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Certificate numbers use the Buddhist Era year, as on all DTAM documents
    #[test]
    fn test_certificate_number_buddhist_era() {
        assert_eq!(format_certificate_number(2026, 1), "GACP-TH-2569-00001");
        assert_eq!(format_certificate_number(2025, 42), "GACP-TH-2568-00042");
    }

    #[test]
    fn test_application_number_gregorian() {
        assert_eq!(format_application_number(2026, 1), "GACP-APP-2026-000001");
    }

    #[test]
    fn test_batch_number_format() {
        // Buddhist year, 4-char farm prefix, 3-digit sequence
        assert_eq!(format_batch_number(2026, "a1b2", 7), "LOT-2569-A1B2-007");
    }

    #[test]
    fn test_certificate_validity() {
        assert_eq!(CERTIFICATE_VALIDITY_YEARS, 3);
    }

    /// The QR payload resolves on the public tracking host
    #[test]
    fn test_tracking_url() {
        assert_eq!(
            tracking_url("https://trace.gacp.dtam.go.th", "0f9d2c"),
            "https://trace.gacp.dtam.go.th/trace/0f9d2c"
        );
        assert_eq!(
            tracking_url("https://trace.gacp.dtam.go.th/", "0f9d2c"),
            "https://trace.gacp.dtam.go.th/trace/0f9d2c"
        );
    }

    /// The printed verification URL carries the one-time code as a query param
    #[test]
    fn test_verification_url() {
        assert_eq!(
            verification_url(
                "https://gacp.dtam.go.th/certificates",
                "GACP-TH-2569-00001",
                "A1B2C3D4"
            ),
            "https://gacp.dtam.go.th/certificates/verify/GACP-TH-2569-00001?code=A1B2C3D4"
        );
    }

    /// Codes printed on certificates are 8 uppercase hex characters
    #[test]
    fn test_verification_code_shape() {
        for value in [0u32, 1, 0xDEADBEEF, u32::MAX] {
            let code = format!("{:08X}", value);
            assert_eq!(code.len(), 8);
            assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(!code.chars().any(|c| c.is_ascii_lowercase()));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Generated certificate numbers always pass the validator
    #[test]
    fn test_certificate_number_valid(year in 2020i32..2100, sequence in 1i64..99_999) {
        let number = format_certificate_number(year, sequence);
        prop_assert!(validate_certificate_number(&number).is_ok());
    }

    /// Generated application numbers always pass the validator
    #[test]
    fn test_application_number_valid(year in 2020i32..2100, sequence in 1i64..999_999) {
        let number = format_application_number(year, sequence);
        prop_assert!(validate_application_number(&number).is_ok());
    }

    /// The BE year is always 543 ahead and stays 4 digits in our range
    #[test]
    fn test_buddhist_year_offset(year in 2020i32..2100) {
        let be = buddhist_year(year);
        prop_assert_eq!(be - year, 543);
        prop_assert_eq!(be.to_string().len(), 4);
    }

    /// Batch numbers embed the uppercased farm prefix
    #[test]
    fn test_batch_number_prefix(
        year in 2020i32..2100,
        prefix in "[a-f0-9]{4}",
        sequence in 1i64..999,
    ) {
        let number = format_batch_number(year, &prefix, sequence);
        let parts: Vec<&str> = number.split('-').collect();
        prop_assert_eq!(parts.len(), 4);
        prop_assert_eq!(parts[0], "LOT");
        prop_assert_eq!(parts[2], prefix.to_uppercase());
        prop_assert_eq!(parts[3].len(), 3);
    }
}
