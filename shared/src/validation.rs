//! Validation utilities for the GACP Certification Back Office
//!
//! Includes Thailand-specific validations for compliance with local
//! regulations and the DTAM registration requirements.

use rust_decimal::Decimal;

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err("Invalid email format");
    }
    if parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format");
    }
    if !parts[1].contains('.') || parts[1].starts_with('.') || parts[1].ends_with('.') {
        return Err("Invalid email domain");
    }
    Ok(())
}

/// Validate password meets minimum requirements
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate cultivation area in rai (1 rai = 1,600 m²)
pub fn validate_cultivation_area(area_rai: Decimal) -> Result<(), &'static str> {
    if area_rai <= Decimal::ZERO {
        return Err("Cultivation area must be positive");
    }
    // Sanity ceiling; the largest registered herb farms are well under this
    if area_rai > Decimal::from(100_000) {
        return Err("Cultivation area is implausibly large");
    }
    Ok(())
}

// ============================================================================
// Thailand-Specific Validations
// ============================================================================

/// Validate Thai phone number
///
/// Accepts: 0812345678, 081-234-5678, +66812345678, 66812345678
pub fn validate_thai_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if let Some(rest) = digits.strip_prefix("66") {
        // International format, drop country code
        rest.to_string()
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest.to_string()
    } else {
        digits.clone()
    };

    if national.len() != 9 {
        return Err("Thai phone number must have 9 digits after the prefix");
    }
    Ok(())
}

/// Validate a 13-digit Thai national ID using the MOD-11 checksum
pub fn validate_thai_national_id(id: &str) -> Result<(), &'static str> {
    let digits: Vec<u32> = id.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 13 || id.chars().any(|c| !c.is_ascii_digit()) {
        return Err("Thai national ID must be 13 digits");
    }

    let sum: u32 = digits[..12]
        .iter()
        .enumerate()
        .map(|(i, d)| d * (13 - i as u32))
        .sum();
    let check = (11 - (sum % 11)) % 10;

    if check != digits[12] {
        return Err("Invalid Thai national ID checksum");
    }
    Ok(())
}

/// Validate a 13-digit Thai tax ID (juristic persons)
pub fn validate_thai_tax_id(id: &str) -> Result<(), &'static str> {
    if id.len() != 13 || id.chars().any(|c| !c.is_ascii_digit()) {
        return Err("Thai tax ID must be 13 digits");
    }
    Ok(())
}

/// Validate Thai postal code
pub fn validate_thai_postal_code(code: &str) -> Result<(), &'static str> {
    if code.len() != 5 || code.chars().any(|c| !c.is_ascii_digit()) {
        return Err("Thai postal code must be 5 digits");
    }
    Ok(())
}

// ============================================================================
// Document Number Formats
// ============================================================================

/// Validate an application number (GACP-APP-YYYY-NNNNNN)
pub fn validate_application_number(number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = number.split('-').collect();
    if parts.len() != 4 || parts[0] != "GACP" || parts[1] != "APP" {
        return Err("Invalid application number format");
    }
    if parts[2].len() != 4 || parts[2].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid application number year");
    }
    if parts[3].len() != 6 || parts[3].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid application number sequence");
    }
    Ok(())
}

/// Validate a certificate number (GACP-TH-BBBB-NNNNN, Buddhist-era year)
pub fn validate_certificate_number(number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = number.split('-').collect();
    if parts.len() != 4 || parts[0] != "GACP" || parts[1] != "TH" {
        return Err("Invalid certificate number format");
    }
    if parts[2].len() != 4 || parts[2].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid certificate number year");
    }
    if parts[3].len() != 5 || parts[3].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid certificate number sequence");
    }
    Ok(())
}

/// Validate an invoice number (INV-YYYY-NNNNNN)
pub fn validate_invoice_number(number: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = number.split('-').collect();
    if parts.len() != 3 || parts[0] != "INV" {
        return Err("Invalid invoice number format");
    }
    if parts[1].len() != 4 || parts[1].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid invoice number year");
    }
    if parts[2].len() != 6 || parts[2].chars().any(|c| !c.is_ascii_digit()) {
        return Err("Invalid invoice number sequence");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("farmer.name@domain.co.th").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_cultivation_area() {
        assert!(validate_cultivation_area(Decimal::from(5)).is_ok());
        assert!(validate_cultivation_area(Decimal::new(25, 1)).is_ok()); // 2.5 rai
        assert!(validate_cultivation_area(Decimal::ZERO).is_err());
        assert!(validate_cultivation_area(Decimal::from(-1)).is_err());
        assert!(validate_cultivation_area(Decimal::from(200_000)).is_err());
    }

    // ========================================================================
    // Thailand-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_thai_phone_valid() {
        assert!(validate_thai_phone("0812345678").is_ok());
        assert!(validate_thai_phone("081-234-5678").is_ok());
        assert!(validate_thai_phone("+66812345678").is_ok());
        assert!(validate_thai_phone("66812345678").is_ok());
    }

    #[test]
    fn test_validate_thai_phone_invalid() {
        assert!(validate_thai_phone("12345").is_err());
        assert!(validate_thai_phone("123456789012").is_err());
        assert!(validate_thai_phone("abcdefghij").is_err());
    }

    #[test]
    fn test_validate_thai_national_id_valid() {
        // Valid Thai ID with correct checksum
        assert!(validate_thai_national_id("1100700000001").is_ok());
    }

    #[test]
    fn test_validate_thai_national_id_invalid() {
        assert!(validate_thai_national_id("123456789").is_err());
        assert!(validate_thai_national_id("1234567890123").is_err());
        assert!(validate_thai_national_id("110070000000a").is_err());
    }

    #[test]
    fn test_validate_thai_tax_id() {
        assert!(validate_thai_tax_id("0123456789012").is_ok());
        assert!(validate_thai_tax_id("123456789").is_err());
        assert!(validate_thai_tax_id("12345678901234").is_err());
    }

    #[test]
    fn test_validate_thai_postal_code() {
        assert!(validate_thai_postal_code("50200").is_ok());
        assert!(validate_thai_postal_code("10110").is_ok());
        assert!(validate_thai_postal_code("502").is_err());
        assert!(validate_thai_postal_code("5020a").is_err());
    }

    // ========================================================================
    // Document Number Format Tests
    // ========================================================================

    #[test]
    fn test_validate_application_number() {
        assert!(validate_application_number("GACP-APP-2026-000001").is_ok());
        assert!(validate_application_number("GACP-APP-26-000001").is_err());
        assert!(validate_application_number("GACP-2026-000001").is_err());
        assert!(validate_application_number("APP-GACP-2026-000001").is_err());
    }

    #[test]
    fn test_validate_certificate_number() {
        assert!(validate_certificate_number("GACP-TH-2569-00001").is_ok());
        assert!(validate_certificate_number("GACP-TH-2569-001").is_err());
        assert!(validate_certificate_number("GACP-2569-00001").is_err());
    }

    #[test]
    fn test_validate_invoice_number() {
        assert!(validate_invoice_number("INV-2026-000042").is_ok());
        assert!(validate_invoice_number("INV-26-000042").is_err());
        assert!(validate_invoice_number("INVOICE-2026-000042").is_err());
    }
}
