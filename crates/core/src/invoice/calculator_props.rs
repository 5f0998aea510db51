//! Property-based tests for the invoice calculator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::{
    calculate, compute_grand_total, compute_line_total, compute_subtotal, compute_tax_breakdown,
};
use super::error::InvoiceError;
use super::types::{LineItem, TaxRates};

/// Quantities from 0.000 to 10,000.000 (weight-based goods have 3 places).
fn quantity() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|milli| Decimal::new(milli, 3))
}

/// Prices from 0.00 to 1,000,000.00.
fn price() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 0.00 to 100.00 percent.
fn rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn line_item() -> impl Strategy<Value = LineItem> {
    (quantity(), price()).prop_map(|(q, p)| LineItem::new("item", q, p))
}

fn tax_rates() -> impl Strategy<Value = TaxRates> {
    (
        proptest::option::of(rate()),
        proptest::option::of(rate()),
        proptest::option::of(rate()),
    )
        .prop_map(|(cgst, sgst, igst)| TaxRates {
            cgst_percent: cgst,
            sgst_percent: sgst,
            igst_percent: igst,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Line totals are the exact product; nothing is rounded before summing.
    #[test]
    fn prop_line_total_is_exact_product(q in quantity(), p in price()) {
        prop_assert_eq!(compute_line_total(q, p).unwrap(), q * p);
    }

    /// Shuffling line items never changes the subtotal.
    #[test]
    fn prop_subtotal_is_order_independent(
        (items, shuffled) in prop::collection::vec(line_item(), 0..20)
            .prop_flat_map(|items| {
                let shuffled = Just(items.clone()).prop_shuffle();
                (Just(items), shuffled)
            })
    ) {
        prop_assert_eq!(
            compute_subtotal(&items).unwrap(),
            compute_subtotal(&shuffled).unwrap()
        );
    }

    /// A single rate yields `subtotal * r / 100`; absent rates yield zero.
    #[test]
    fn prop_single_rate_formula(subtotal in price(), r in rate()) {
        let rates = TaxRates { cgst_percent: Some(r), ..TaxRates::none() };
        let breakdown = compute_tax_breakdown(subtotal, &rates).unwrap();
        prop_assert_eq!(breakdown.cgst, subtotal * r / Decimal::ONE_HUNDRED);
        prop_assert_eq!(breakdown.sgst, Decimal::ZERO);
        prop_assert_eq!(breakdown.igst, Decimal::ZERO);
    }

    /// The grand total is exactly the sum of the figures shown next to it.
    #[test]
    fn prop_grand_total_is_additive(
        items in prop::collection::vec(line_item(), 0..20),
        rates in tax_rates(),
    ) {
        let totals = calculate(&items, &rates).unwrap();
        prop_assert_eq!(
            totals.grand_total(),
            totals.subtotal() + totals.cgst_amount() + totals.sgst_amount() + totals.igst_amount()
        );

        // The step-by-step path agrees with the composed one.
        let subtotal = compute_subtotal(&items).unwrap();
        let breakdown = compute_tax_breakdown(subtotal, &rates).unwrap();
        prop_assert_eq!(compute_grand_total(subtotal, &breakdown).unwrap(), totals.grand_total());
    }

    /// Same inputs, bit-identical outputs.
    #[test]
    fn prop_calculation_is_idempotent(
        items in prop::collection::vec(line_item(), 0..20),
        rates in tax_rates(),
    ) {
        let first = calculate(&items, &rates).unwrap();
        let second = calculate(&items, &rates).unwrap();
        for ((_, a), (_, b)) in first.fields().into_iter().zip(second.fields()) {
            prop_assert_eq!(a.serialize(), b.serialize());
        }
    }

    /// Split 9+9 and integrated 18 produce the same grand total.
    #[test]
    fn prop_split_and_integrated_agree(
        items in prop::collection::vec(line_item(), 0..20),
        half in (0i64..=5_000i64).prop_map(|bp| Decimal::new(bp, 2)),
    ) {
        let split = calculate(&items, &TaxRates::intrastate(half, half)).unwrap();
        let integrated = calculate(&items, &TaxRates::interstate(half + half)).unwrap();
        prop_assert_eq!(split.grand_total(), integrated.grand_total());
    }

    /// Rates above 100 are always rejected, never clamped.
    #[test]
    fn prop_rate_above_hundred_rejected(
        subtotal in price(),
        excess in 1i64..1_000_000i64,
    ) {
        let r = Decimal::ONE_HUNDRED + Decimal::new(excess, 2);
        let result = compute_tax_breakdown(subtotal, &TaxRates::interstate(r));
        let is_invalid_rate = matches!(result, Err(InvoiceError::InvalidTaxRate { .. }));
        prop_assert!(is_invalid_rate);
    }
}
