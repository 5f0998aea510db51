//! Invoice totals calculator.
//!
//! This is the single place where line totals, GST amounts, and the grand
//! total are computed. Form previews, record finalization, and read-side
//! record checks all call [`calculate`], so what the user sees and what is
//! stored cannot drift apart.
//!
//! Amounts keep full `Decimal` precision throughout; rounding happens only
//! at the presentation boundary via [`InvoiceTotals::rounded`].

use rust_decimal::Decimal;

use super::error::{InputProblem, InvoiceError};
use super::numeric::MAX_TAX_PERCENT;
use super::types::{InvoiceTotals, LineItem, TaxBreakdown, TaxKind, TaxRates};

const TAXES: [TaxKind; 3] = [TaxKind::Cgst, TaxKind::Sgst, TaxKind::Igst];

/// Computes `quantity * unit_price`, tax-exclusive and unrounded.
///
/// Zero is accepted for both inputs; negative values are rejected.
///
/// # Errors
///
/// Returns `InvalidQuantity` / `InvalidPrice` for negative inputs and
/// `Overflow` if the product does not fit.
pub fn compute_line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, InvoiceError> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(InvoiceError::InvalidQuantity {
            line: None,
            problem: InputProblem::Negative,
        });
    }
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(InvoiceError::InvalidPrice {
            line: None,
            problem: InputProblem::Negative,
        });
    }

    quantity
        .checked_mul(unit_price)
        .ok_or(InvoiceError::Overflow)
}

/// Sums the line totals of all items. An empty list sums to zero.
///
/// # Errors
///
/// Returns the first line error, tagged with the line's index.
pub fn compute_subtotal(items: &[LineItem]) -> Result<Decimal, InvoiceError> {
    items
        .iter()
        .enumerate()
        .try_fold(Decimal::ZERO, |acc, (index, item)| {
            let line_total = compute_line_total(item.quantity, item.unit_price)
                .map_err(|e| e.at_line(index))?;
            acc.checked_add(line_total).ok_or(InvoiceError::Overflow)
        })
}

/// Applies each supplied rate to the subtotal; absent rates contribute zero.
///
/// Rates are percentages and must lie in `[0, 100]`. Out-of-range rates are
/// rejected rather than clamped, so a mistyped `180` never yields a total.
///
/// # Errors
///
/// Returns `InvalidTaxRate` naming the first bad rate, or `Overflow`.
pub fn compute_tax_breakdown(subtotal: Decimal, rates: &TaxRates) -> Result<TaxBreakdown, InvoiceError> {
    let mut amounts = [Decimal::ZERO; 3];
    for (slot, tax) in amounts.iter_mut().zip(TAXES) {
        if let Some(rate) = rates.rate(tax) {
            *slot = tax_amount(subtotal, tax, rate)?;
        }
    }

    let [cgst, sgst, igst] = amounts;
    Ok(TaxBreakdown { cgst, sgst, igst })
}

fn tax_amount(subtotal: Decimal, tax: TaxKind, rate: Decimal) -> Result<Decimal, InvoiceError> {
    validate_rate(tax, rate)?;
    subtotal
        .checked_mul(rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        // subtotal * rate can overflow even when the amount itself fits
        .or_else(|| {
            rate.checked_div(Decimal::ONE_HUNDRED)
                .and_then(|fraction| subtotal.checked_mul(fraction))
        })
        .ok_or(InvoiceError::Overflow)
}

/// Checks that a rate lies in `[0, 100]`.
///
/// # Errors
///
/// Returns `InvalidTaxRate` otherwise.
pub fn validate_rate(tax: TaxKind, rate: Decimal) -> Result<(), InvoiceError> {
    if rate.is_sign_negative() && !rate.is_zero() {
        return Err(InvoiceError::InvalidTaxRate {
            tax,
            problem: InputProblem::Negative,
        });
    }
    if rate > MAX_TAX_PERCENT {
        return Err(InvoiceError::InvalidTaxRate {
            tax,
            problem: InputProblem::OutOfRange {
                max: MAX_TAX_PERCENT,
            },
        });
    }
    Ok(())
}

/// `subtotal + cgst + sgst + igst`.
///
/// # Errors
///
/// Returns `Overflow` if the sum does not fit.
pub fn compute_grand_total(subtotal: Decimal, breakdown: &TaxBreakdown) -> Result<Decimal, InvoiceError> {
    TAXES
        .iter()
        .try_fold(subtotal, |acc, tax| acc.checked_add(breakdown.amount(*tax)))
        .ok_or(InvoiceError::Overflow)
}

/// Computes the full set of totals for an invoice.
///
/// Either every figure is valid or an error is returned; no partial
/// totals are ever produced.
///
/// # Errors
///
/// Returns the first input error found (lines first, then rates).
pub fn calculate(items: &[LineItem], rates: &TaxRates) -> Result<InvoiceTotals, InvoiceError> {
    let subtotal = compute_subtotal(items)?;
    let breakdown = compute_tax_breakdown(subtotal, rates)?;
    let grand_total = compute_grand_total(subtotal, &breakdown)?;
    Ok(InvoiceTotals::from_parts(subtotal, breakdown, grand_total))
}
