//! Invoice and quote domain types
//!
//! Fee schedule and totals live here so invoice generation has exactly one
//! implementation, shared by the application, quote, and payment services.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The two sequential payment milestones of a certification request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePhase {
    /// Phase 1: document review fee
    ApplicationFee,
    /// Phase 2: on-site audit fee
    AuditFee,
}

impl ServicePhase {
    pub const ALL: [ServicePhase; 2] = [ServicePhase::ApplicationFee, ServicePhase::AuditFee];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePhase::ApplicationFee => "APPLICATION_FEE",
            ServicePhase::AuditFee => "AUDIT_FEE",
        }
    }

    pub fn phase_number(&self) -> u8 {
        match self {
            ServicePhase::ApplicationFee => 1,
            ServicePhase::AuditFee => 2,
        }
    }

    /// Standard DTAM fee in Thai Baht, before VAT
    pub fn standard_fee(&self) -> Decimal {
        match self {
            ServicePhase::ApplicationFee => Decimal::from(5_000),
            ServicePhase::AuditFee => Decimal::from(25_000),
        }
    }

    pub fn description_th(&self) -> &'static str {
        match self {
            ServicePhase::ApplicationFee => "ค่าธรรมเนียมคำขอและตรวจเอกสาร (ระยะที่ 1)",
            ServicePhase::AuditFee => "ค่าธรรมเนียมตรวจประเมินแหล่งปลูก (ระยะที่ 2)",
        }
    }
}

impl std::str::FromStr for ServicePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown service phase: {}", s))
    }
}

/// Status of an invoice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Only pending and overdue invoices accept payment
    pub fn is_payable(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown invoice status: {}", s))
    }
}

/// Status of a quote
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 5] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
        QuoteStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown quote status: {}", s))
    }
}

/// Thai VAT rate applied to certification fees
pub const VAT_RATE_PERCENT: u32 = 7;

/// Days until a newly issued invoice falls due
pub const INVOICE_DUE_DAYS: i64 = 15;

/// One billable line on an invoice or quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    pub description: String,
    pub description_th: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl InvoiceItem {
    pub fn amount(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Computed amount breakdown for an invoice or quote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmountBreakdown {
    pub subtotal: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
}

/// Compute subtotal, 7% VAT, and total for a set of line items.
/// Amounts are rounded to satang (2 decimal places).
pub fn compute_totals(items: &[InvoiceItem]) -> AmountBreakdown {
    let subtotal: Decimal = items.iter().map(InvoiceItem::amount).sum();
    let vat = (subtotal * Decimal::from(VAT_RATE_PERCENT) / Decimal::from(100)).round_dp(2);
    AmountBreakdown {
        subtotal,
        vat,
        total: subtotal + vat,
    }
}

/// Standard single-line items for a phase invoice
pub fn phase_items(phase: ServicePhase) -> Vec<InvoiceItem> {
    vec![InvoiceItem {
        description: match phase {
            ServicePhase::ApplicationFee => "GACP application and document review fee (Phase 1)",
            ServicePhase::AuditFee => "GACP on-site audit fee (Phase 2)",
        }
        .to_string(),
        description_th: Some(phase.description_th().to_string()),
        quantity: 1,
        unit_price: phase.standard_fee(),
    }]
}

/// Format an invoice number: INV-YYYY-NNNNNN
pub fn format_invoice_number(year: i32, sequence: i64) -> String {
    format!("INV-{}-{:06}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_schedule() {
        assert_eq!(
            ServicePhase::ApplicationFee.standard_fee(),
            Decimal::from(5_000)
        );
        assert_eq!(ServicePhase::AuditFee.standard_fee(), Decimal::from(25_000));
    }

    #[test]
    fn test_phase_numbers() {
        assert_eq!(ServicePhase::ApplicationFee.phase_number(), 1);
        assert_eq!(ServicePhase::AuditFee.phase_number(), 2);
    }

    #[test]
    fn test_phase1_totals() {
        let totals = compute_totals(&phase_items(ServicePhase::ApplicationFee));
        assert_eq!(totals.subtotal, Decimal::from(5_000));
        assert_eq!(totals.vat, Decimal::from(350));
        assert_eq!(totals.total, Decimal::from(5_350));
    }

    #[test]
    fn test_phase2_totals() {
        let totals = compute_totals(&phase_items(ServicePhase::AuditFee));
        assert_eq!(totals.subtotal, Decimal::from(25_000));
        assert_eq!(totals.vat, Decimal::from(1_750));
        assert_eq!(totals.total, Decimal::from(26_750));
    }

    #[test]
    fn test_vat_rounding() {
        let items = vec![InvoiceItem {
            description: "Replacement certificate".to_string(),
            description_th: None,
            quantity: 1,
            unit_price: Decimal::new(50055, 2), // 500.55
        }];
        let totals = compute_totals(&items);
        // 7% of 500.55 = 35.0385, rounded to 35.04 (banker's rounding on .5 digits)
        assert_eq!(totals.vat, Decimal::new(3504, 2));
        assert_eq!(totals.total, totals.subtotal + totals.vat);
    }

    #[test]
    fn test_multi_item_totals() {
        let items = vec![
            InvoiceItem {
                description: "Audit fee".to_string(),
                description_th: None,
                quantity: 1,
                unit_price: Decimal::from(25_000),
            },
            InvoiceItem {
                description: "Travel surcharge".to_string(),
                description_th: None,
                quantity: 2,
                unit_price: Decimal::from(1_500),
            },
        ];
        let totals = compute_totals(&items);
        assert_eq!(totals.subtotal, Decimal::from(28_000));
        assert_eq!(totals.vat, Decimal::from(1_960));
        assert_eq!(totals.total, Decimal::from(29_960));
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(format_invoice_number(2026, 7), "INV-2026-000007");
        assert!(crate::validation::validate_invoice_number(&format_invoice_number(2026, 7)).is_ok());
    }

    #[test]
    fn test_payable_statuses() {
        assert!(InvoiceStatus::Pending.is_payable());
        assert!(InvoiceStatus::Overdue.is_payable());
        assert!(!InvoiceStatus::Paid.is_payable());
        assert!(!InvoiceStatus::Cancelled.is_payable());
    }
}
