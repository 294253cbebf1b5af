//! Application domain types

use serde::{Deserialize, Serialize};

/// Kind of certification service being requested
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    New,
    Renewal,
    Replacement,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::New,
        ServiceType::Renewal,
        ServiceType::Replacement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::New => "new",
            ServiceType::Renewal => "renewal",
            ServiceType::Replacement => "replacement",
        }
    }

    /// Replacement requests are priced by staff quote rather than the
    /// standard fee schedule
    pub fn requires_quote(&self) -> bool {
        matches!(self, ServiceType::Replacement)
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown service type: {}", s))
    }
}

/// Type of cultivation area the certification covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    Outdoor,
    Indoor,
    Greenhouse,
    Mixed,
}

impl AreaType {
    pub const ALL: [AreaType; 4] = [
        AreaType::Outdoor,
        AreaType::Indoor,
        AreaType::Greenhouse,
        AreaType::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaType::Outdoor => "outdoor",
            AreaType::Indoor => "indoor",
            AreaType::Greenhouse => "greenhouse",
            AreaType::Mixed => "mixed",
        }
    }

    pub fn display_name_th(&self) -> &'static str {
        match self {
            AreaType::Outdoor => "กลางแจ้ง",
            AreaType::Indoor => "ในอาคาร",
            AreaType::Greenhouse => "โรงเรือน",
            AreaType::Mixed => "ผสมผสาน",
        }
    }
}

impl std::str::FromStr for AreaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown area type: {}", s))
    }
}

/// Outcome of an on-site audit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResult {
    Pass,
    Fail,
    /// Passed with corrections the farmer must make and resubmit
    Conditional,
}

impl AuditResult {
    pub const ALL: [AuditResult; 3] =
        [AuditResult::Pass, AuditResult::Fail, AuditResult::Conditional];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Pass => "PASS",
            AuditResult::Fail => "FAIL",
            AuditResult::Conditional => "CONDITIONAL",
        }
    }
}

impl std::str::FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown audit result: {}", s))
    }
}

/// Format an application number: GACP-APP-YYYY-NNNNNN
pub fn format_application_number(year: i32, sequence: i64) -> String {
    format!("GACP-APP-{}-{:06}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_round_trip() {
        for v in ServiceType::ALL {
            assert_eq!(v.as_str().parse::<ServiceType>().unwrap(), v);
        }
    }

    #[test]
    fn test_quote_requirement() {
        assert!(!ServiceType::New.requires_quote());
        assert!(!ServiceType::Renewal.requires_quote());
        assert!(ServiceType::Replacement.requires_quote());
    }

    #[test]
    fn test_application_number_format() {
        assert_eq!(format_application_number(2026, 1), "GACP-APP-2026-000001");
        assert_eq!(format_application_number(2026, 123456), "GACP-APP-2026-123456");
        assert!(crate::validation::validate_application_number(
            &format_application_number(2026, 42)
        )
        .is_ok());
    }

    #[test]
    fn test_audit_result_round_trip() {
        for v in AuditResult::ALL {
            assert_eq!(v.as_str().parse::<AuditResult>().unwrap(), v);
        }
    }
}
