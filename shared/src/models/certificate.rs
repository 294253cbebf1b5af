//! Certificate domain types

use serde::{Deserialize, Serialize};

use crate::types::buddhist_year;

/// Status of an issued certificate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub const ALL: [CertificateStatus; 3] = [
        CertificateStatus::Active,
        CertificateStatus::Revoked,
        CertificateStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "active",
            CertificateStatus::Revoked => "revoked",
            CertificateStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for CertificateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown certificate status: {}", s))
    }
}

/// Standard GACP certificate validity
pub const CERTIFICATE_VALIDITY_YEARS: i32 = 3;

/// Format a certificate number using the Buddhist-era year:
/// GACP-TH-BBBB-NNNNN (e.g. GACP-TH-2569-00001)
pub fn format_certificate_number(gregorian_year: i32, sequence: i64) -> String {
    format!(
        "GACP-TH-{}-{:05}",
        buddhist_year(gregorian_year),
        sequence
    )
}

/// Public verification URL carried inside the certificate QR code
pub fn verification_url(base_url: &str, certificate_number: &str, code: &str) -> String {
    format!(
        "{}/verify/{}?code={}",
        base_url.trim_end_matches('/'),
        certificate_number,
        code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_number_uses_buddhist_year() {
        assert_eq!(format_certificate_number(2026, 1), "GACP-TH-2569-00001");
        assert_eq!(format_certificate_number(2024, 123), "GACP-TH-2567-00123");
        assert!(crate::validation::validate_certificate_number(
            &format_certificate_number(2026, 1)
        )
        .is_ok());
    }

    #[test]
    fn test_verification_url() {
        assert_eq!(
            verification_url("https://dtam.moph.go.th", "GACP-TH-2569-00001", "A1B2C3D4"),
            "https://dtam.moph.go.th/verify/GACP-TH-2569-00001?code=A1B2C3D4"
        );
        // Trailing slash is normalized
        assert_eq!(
            verification_url("https://dtam.moph.go.th/", "GACP-TH-2569-00001", "A1B2C3D4"),
            "https://dtam.moph.go.th/verify/GACP-TH-2569-00001?code=A1B2C3D4"
        );
    }

    #[test]
    fn test_status_round_trip() {
        for v in CertificateStatus::ALL {
            assert_eq!(v.as_str().parse::<CertificateStatus>().unwrap(), v);
        }
    }
}
