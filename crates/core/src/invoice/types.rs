//! Invoice domain types.
//!
//! Line items and tax rates are the only inputs; every total is derived from
//! them by the calculator and never edited directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use khata_shared::types::money::round_for_display;

/// One product or service row on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name or reference.
    pub description: String,
    /// Quantity sold; fractional for weight-based goods.
    pub quantity: Decimal,
    /// Price per unit, tax-exclusive.
    pub unit_price: Decimal,
}

impl LineItem {
    /// Creates a line item.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// The three GST components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxKind {
    /// Central GST (intra-state, paired with SGST).
    Cgst,
    /// State GST (intra-state, paired with CGST).
    Sgst,
    /// Integrated GST (inter-state, alone).
    Igst,
}

impl TaxKind {
    /// Name of the matching rate field in `TaxRates`.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Cgst => "cgst_percent",
            Self::Sgst => "sgst_percent",
            Self::Igst => "igst_percent",
        }
    }
}

impl std::fmt::Display for TaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cgst => write!(f, "CGST"),
            Self::Sgst => write!(f, "SGST"),
            Self::Igst => write!(f, "IGST"),
        }
    }
}

/// Which GST regime the supplied rates describe.
///
/// Informational only: the calculator sums whatever rates are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// No rates supplied.
    Untaxed,
    /// CGST and/or SGST only.
    Intrastate,
    /// IGST only.
    Interstate,
    /// IGST together with CGST/SGST; usually a data-entry mistake.
    Mixed,
}

/// Optional percentage rates applied to the subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRates {
    /// CGST percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cgst_percent: Option<Decimal>,
    /// SGST percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sgst_percent: Option<Decimal>,
    /// IGST percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub igst_percent: Option<Decimal>,
}

impl TaxRates {
    /// No taxes.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            cgst_percent: None,
            sgst_percent: None,
            igst_percent: None,
        }
    }

    /// Domestic split: the same rate for CGST and SGST.
    #[must_use]
    pub const fn intrastate(cgst: Decimal, sgst: Decimal) -> Self {
        Self {
            cgst_percent: Some(cgst),
            sgst_percent: Some(sgst),
            igst_percent: None,
        }
    }

    /// Inter-state: IGST only.
    #[must_use]
    pub const fn interstate(igst: Decimal) -> Self {
        Self {
            cgst_percent: None,
            sgst_percent: None,
            igst_percent: Some(igst),
        }
    }

    /// Returns the rate for one tax.
    #[must_use]
    pub const fn rate(&self, kind: TaxKind) -> Option<Decimal> {
        match kind {
            TaxKind::Cgst => self.cgst_percent,
            TaxKind::Sgst => self.sgst_percent,
            TaxKind::Igst => self.igst_percent,
        }
    }

    /// Classifies the supplied rates.
    #[must_use]
    pub const fn mode(&self) -> TaxMode {
        let split = self.cgst_percent.is_some() || self.sgst_percent.is_some();
        match (split, self.igst_percent.is_some()) {
            (false, false) => TaxMode::Untaxed,
            (true, false) => TaxMode::Intrastate,
            (false, true) => TaxMode::Interstate,
            (true, true) => TaxMode::Mixed,
        }
    }
}

/// Tax amounts for one subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// CGST amount.
    pub cgst: Decimal,
    /// SGST amount.
    pub sgst: Decimal,
    /// IGST amount.
    pub igst: Decimal,
}

impl TaxBreakdown {
    /// Returns the amount for one tax.
    #[must_use]
    pub const fn amount(&self, kind: TaxKind) -> Decimal {
        match kind {
            TaxKind::Cgst => self.cgst,
            TaxKind::Sgst => self.sgst,
            TaxKind::Igst => self.igst,
        }
    }
}

/// Subtotal, tax amounts, and grand total for an invoice.
///
/// Only the calculator builds values of this type, so the grand total
/// always equals the subtotal plus the three tax amounts it sits next to.
/// Deserialized copies are not trusted; records re-check them on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    subtotal: Decimal,
    cgst_amount: Decimal,
    sgst_amount: Decimal,
    igst_amount: Decimal,
    grand_total: Decimal,
}

impl InvoiceTotals {
    pub(crate) const fn from_parts(
        subtotal: Decimal,
        breakdown: TaxBreakdown,
        grand_total: Decimal,
    ) -> Self {
        Self {
            subtotal,
            cgst_amount: breakdown.cgst,
            sgst_amount: breakdown.sgst,
            igst_amount: breakdown.igst,
            grand_total,
        }
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// CGST amount.
    #[must_use]
    pub const fn cgst_amount(&self) -> Decimal {
        self.cgst_amount
    }

    /// SGST amount.
    #[must_use]
    pub const fn sgst_amount(&self) -> Decimal {
        self.sgst_amount
    }

    /// IGST amount.
    #[must_use]
    pub const fn igst_amount(&self) -> Decimal {
        self.igst_amount
    }

    /// Subtotal plus all taxes.
    #[must_use]
    pub const fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    /// Tax amounts as a breakdown.
    #[must_use]
    pub const fn breakdown(&self) -> TaxBreakdown {
        TaxBreakdown {
            cgst: self.cgst_amount,
            sgst: self.sgst_amount,
            igst: self.igst_amount,
        }
    }

    /// Named figures, in display order.
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, Decimal); 5] {
        [
            ("subtotal", self.subtotal),
            ("cgst_amount", self.cgst_amount),
            ("sgst_amount", self.sgst_amount),
            ("igst_amount", self.igst_amount),
            ("grand_total", self.grand_total),
        ]
    }

    /// Copy with every figure rounded to two places for presentation.
    ///
    /// Each figure is rounded on its own, so the rounded grand total may
    /// differ by a paisa from the sum of the rounded parts.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_for_display(self.subtotal),
            cgst_amount: round_for_display(self.cgst_amount),
            sgst_amount: round_for_display(self.sgst_amount),
            igst_amount: round_for_display(self.igst_amount),
            grand_total: round_for_display(self.grand_total),
        }
    }
}

/// Who the invoice is billed to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer or business name.
    pub name: String,
    /// GST identification number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    /// Billing address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Contact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_mode() {
        assert_eq!(TaxRates::none().mode(), TaxMode::Untaxed);
        assert_eq!(
            TaxRates::intrastate(dec!(9), dec!(9)).mode(),
            TaxMode::Intrastate
        );
        assert_eq!(TaxRates::interstate(dec!(18)).mode(), TaxMode::Interstate);

        let mixed = TaxRates {
            cgst_percent: Some(dec!(9)),
            sgst_percent: None,
            igst_percent: Some(dec!(18)),
        };
        assert_eq!(mixed.mode(), TaxMode::Mixed);
    }

    #[test]
    fn test_rate_lookup() {
        let rates = TaxRates::intrastate(dec!(6), dec!(6));
        assert_eq!(rates.rate(TaxKind::Cgst), Some(dec!(6)));
        assert_eq!(rates.rate(TaxKind::Igst), None);
    }

    #[test]
    fn test_rounded_totals() {
        let totals = InvoiceTotals::from_parts(
            dec!(10.005),
            TaxBreakdown {
                cgst: dec!(0.90045),
                sgst: dec!(0.90045),
                igst: Decimal::ZERO,
            },
            dec!(11.8059),
        );
        let rounded = totals.rounded();
        assert_eq!(rounded.subtotal().to_string(), "10.01");
        assert_eq!(rounded.cgst_amount().to_string(), "0.90");
        assert_eq!(rounded.igst_amount().to_string(), "0.00");
        assert_eq!(rounded.grand_total().to_string(), "11.81");
    }

    #[test]
    fn test_tax_rates_serde_skips_absent() {
        let json = serde_json::to_value(TaxRates::interstate(dec!(18))).unwrap();
        assert_eq!(json, serde_json::json!({ "igst_percent": "18" }));

        let parsed: TaxRates = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed, TaxRates::none());
    }
}
