//! Fee schedule and invoice totals tests
//!
//! Tests for billing including:
//! - The two-phase DTAM fee schedule with 7% VAT
//! - Totals arithmetic over arbitrary line items
//! - Document number formats

use proptest::prelude::*;
use rust_decimal::Decimal;

use shared::models::{
    compute_totals, format_invoice_number, phase_items, InvoiceItem, InvoiceStatus, ServicePhase,
    VAT_RATE_PERCENT,
};
use shared::validation::validate_invoice_number;

fn item_strategy() -> impl Strategy<Value = InvoiceItem> {
    // Unit prices up to one million baht with satang precision
    (1u32..10, 1i64..100_000_000).prop_map(|(quantity, satang)| InvoiceItem {
        description: "line item".to_string(),
        description_th: None,
        quantity,
        unit_price: Decimal::new(satang, 2),
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Phase 1 is the 5,000 baht document review fee
    #[test]
    fn test_phase1_invoice_amounts() {
        let totals = compute_totals(&phase_items(ServicePhase::ApplicationFee));
        assert_eq!(totals.subtotal, Decimal::from(5_000));
        assert_eq!(totals.vat, Decimal::from(350));
        assert_eq!(totals.total, Decimal::from(5_350));
    }

    /// Phase 2 is the 25,000 baht on-site audit fee
    #[test]
    fn test_phase2_invoice_amounts() {
        let totals = compute_totals(&phase_items(ServicePhase::AuditFee));
        assert_eq!(totals.subtotal, Decimal::from(25_000));
        assert_eq!(totals.vat, Decimal::from(1_750));
        assert_eq!(totals.total, Decimal::from(26_750));
    }

    /// Phase invoices carry a bilingual single line item
    #[test]
    fn test_phase_items_shape() {
        for phase in ServicePhase::ALL {
            let items = phase_items(phase);
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].quantity, 1);
            assert_eq!(items[0].unit_price, phase.standard_fee());
            assert!(items[0].description_th.is_some());
        }
    }

    #[test]
    fn test_vat_rate() {
        assert_eq!(VAT_RATE_PERCENT, 7);
    }

    /// An empty item list produces a zero invoice, not an error
    #[test]
    fn test_empty_items() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.vat, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_only_pending_and_overdue_are_payable() {
        assert!(InvoiceStatus::Pending.is_payable());
        assert!(InvoiceStatus::Overdue.is_payable());
        assert!(!InvoiceStatus::Paid.is_payable());
        assert!(!InvoiceStatus::Cancelled.is_payable());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// total = subtotal + vat, always
    #[test]
    fn test_total_is_subtotal_plus_vat(
        items in proptest::collection::vec(item_strategy(), 0..8),
    ) {
        let totals = compute_totals(&items);
        prop_assert_eq!(totals.total, totals.subtotal + totals.vat);
    }

    /// Subtotal is the sum of quantity * unit_price over all lines
    #[test]
    fn test_subtotal_is_line_sum(
        items in proptest::collection::vec(item_strategy(), 0..8),
    ) {
        let totals = compute_totals(&items);
        let expected: Decimal = items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        prop_assert_eq!(totals.subtotal, expected);
    }

    /// VAT never exceeds the 7% of the subtotal by more than rounding error
    #[test]
    fn test_vat_bounds(
        items in proptest::collection::vec(item_strategy(), 1..8),
    ) {
        let totals = compute_totals(&items);
        let exact = totals.subtotal * Decimal::from(VAT_RATE_PERCENT) / Decimal::from(100);
        let diff = (totals.vat - exact).abs();
        // Rounded to satang, so at most half a satang off
        prop_assert!(diff <= Decimal::new(5, 3));
        prop_assert!(totals.vat >= Decimal::ZERO);
    }

    /// VAT amounts are always representable in satang
    #[test]
    fn test_vat_satang_precision(
        items in proptest::collection::vec(item_strategy(), 1..8),
    ) {
        let totals = compute_totals(&items);
        prop_assert_eq!(totals.vat, totals.vat.round_dp(2));
    }

    /// Generated invoice numbers always pass the format validator
    #[test]
    fn test_invoice_number_format(year in 2020i32..2100, sequence in 1i64..999_999) {
        let number = format_invoice_number(year, sequence);
        prop_assert!(validate_invoice_number(&number).is_ok());
        prop_assert!(number.starts_with("INV-"));
    }
}
