//! Farm and traceability-chain domain types

use serde::{Deserialize, Serialize};

use crate::types::buddhist_year;

/// How the crop is cultivated
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CultivationMethod {
    Outdoor,
    Indoor,
    Greenhouse,
    Mixed,
}

impl CultivationMethod {
    pub const ALL: [CultivationMethod; 4] = [
        CultivationMethod::Outdoor,
        CultivationMethod::Indoor,
        CultivationMethod::Greenhouse,
        CultivationMethod::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CultivationMethod::Outdoor => "outdoor",
            CultivationMethod::Indoor => "indoor",
            CultivationMethod::Greenhouse => "greenhouse",
            CultivationMethod::Mixed => "mixed",
        }
    }
}

impl std::str::FromStr for CultivationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown cultivation method: {}", s))
    }
}

/// Status of a planting cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Planned,
    Planted,
    Harvested,
    Closed,
}

impl CycleStatus {
    pub const ALL: [CycleStatus; 4] = [
        CycleStatus::Planned,
        CycleStatus::Planted,
        CycleStatus::Harvested,
        CycleStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Planned => "planned",
            CycleStatus::Planted => "planted",
            CycleStatus::Harvested => "harvested",
            CycleStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for CycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown cycle status: {}", s))
    }
}

/// Status of a harvest batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Growing,
    Harvested,
    Packed,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 3] = [
        BatchStatus::Growing,
        BatchStatus::Harvested,
        BatchStatus::Packed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Growing => "growing",
            BatchStatus::Harvested => "harvested",
            BatchStatus::Packed => "packed",
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown batch status: {}", s))
    }
}

/// Format a harvest batch number: LOT-BBBB-XXXX-NNN where XXXX is the
/// uppercased head of the farm id and NNN a per-farm sequence
pub fn format_batch_number(gregorian_year: i32, farm_prefix: &str, sequence: i64) -> String {
    format!(
        "LOT-{}-{}-{:03}",
        buddhist_year(gregorian_year),
        farm_prefix.to_uppercase(),
        sequence
    )
}

/// Public tracking URL carried inside a batch QR code
pub fn tracking_url(base_url: &str, qr_code: &str) -> String {
    format!("{}/trace/{}", base_url.trim_end_matches('/'), qr_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_number_format() {
        assert_eq!(format_batch_number(2026, "a3f9", 1), "LOT-2569-A3F9-001");
        assert_eq!(format_batch_number(2026, "B2C4", 42), "LOT-2569-B2C4-042");
    }

    #[test]
    fn test_tracking_url() {
        assert_eq!(
            tracking_url("https://trace.gacp.dtam.go.th", "QR123"),
            "https://trace.gacp.dtam.go.th/trace/QR123"
        );
        assert_eq!(
            tracking_url("https://trace.gacp.dtam.go.th/", "QR123"),
            "https://trace.gacp.dtam.go.th/trace/QR123"
        );
    }
}
