//! Parsing of user-entered numbers.
//!
//! Form fields arrive as JSON numbers or as text. Both are parsed into
//! `Decimal` without passing through `f64`. Anything that is not a finite
//! decimal is reported, never coerced to zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{InputProblem, InvoiceError};
use super::types::{LineItem, TaxKind, TaxRates};

/// Largest accepted tax rate, in percent.
pub const MAX_TAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// A number as typed into a form: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    /// A JSON number literal.
    Number(serde_json::Number),
    /// Free text, e.g. `"12.50"`.
    Text(String),
}

impl NumericInput {
    /// Parses the input into a decimal.
    ///
    /// Accepts plain (`12.5`) and scientific (`1.25e1`) notation. Surrounding
    /// whitespace is ignored. Sign is not checked here.
    ///
    /// # Errors
    ///
    /// Returns `InputProblem::NonNumeric` for empty or non-decimal text.
    pub fn parse(&self) -> Result<Decimal, InputProblem> {
        let raw = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        };
        parse_decimal(&raw).ok_or(InputProblem::NonNumeric(raw))
    }

    /// Parses a value that must be zero or greater.
    ///
    /// # Errors
    ///
    /// Returns `InputProblem` if the value is not numeric or is negative.
    pub fn parse_non_negative(&self) -> Result<Decimal, InputProblem> {
        let value = self.parse()?;
        if value.is_zero() {
            // "-0" is accepted as plain zero
            return Ok(Decimal::ZERO);
        }
        if value.is_sign_negative() {
            return Err(InputProblem::Negative);
        }
        Ok(value)
    }
}

impl From<Decimal> for NumericInput {
    fn from(value: Decimal) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .ok()
        .or_else(|| Decimal::from_scientific(raw).ok())
}

/// A line item as submitted, before its numbers are parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    /// Product name or reference.
    #[serde(default)]
    pub description: String,
    /// Quantity as entered.
    pub quantity: NumericInput,
    /// Unit price as entered.
    pub unit_price: NumericInput,
}

impl RawLineItem {
    /// Parses the line, tagging errors with `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `InvalidPrice` for unusable numbers.
    pub fn parse(&self, index: usize) -> Result<LineItem, InvoiceError> {
        let quantity =
            self.quantity
                .parse_non_negative()
                .map_err(|problem| InvoiceError::InvalidQuantity {
                    line: Some(index),
                    problem,
                })?;
        let unit_price =
            self.unit_price
                .parse_non_negative()
                .map_err(|problem| InvoiceError::InvalidPrice {
                    line: Some(index),
                    problem,
                })?;
        Ok(LineItem::new(self.description.trim(), quantity, unit_price))
    }
}

/// Tax rates as submitted; absent fields mean "not charged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTaxRates {
    /// CGST percentage as entered.
    #[serde(default)]
    pub cgst_percent: Option<NumericInput>,
    /// SGST percentage as entered.
    #[serde(default)]
    pub sgst_percent: Option<NumericInput>,
    /// IGST percentage as entered.
    #[serde(default)]
    pub igst_percent: Option<NumericInput>,
}

impl RawTaxRates {
    /// Parses and range-checks every supplied rate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTaxRate` for a rate that is not a number, negative,
    /// or above 100.
    pub fn parse(&self) -> Result<TaxRates, InvoiceError> {
        Ok(TaxRates {
            cgst_percent: parse_rate(TaxKind::Cgst, self.cgst_percent.as_ref())?,
            sgst_percent: parse_rate(TaxKind::Sgst, self.sgst_percent.as_ref())?,
            igst_percent: parse_rate(TaxKind::Igst, self.igst_percent.as_ref())?,
        })
    }
}

fn parse_rate(tax: TaxKind, input: Option<&NumericInput>) -> Result<Option<Decimal>, InvoiceError> {
    let Some(input) = input else {
        return Ok(None);
    };
    let rate = input
        .parse_non_negative()
        .map_err(|problem| InvoiceError::InvalidTaxRate { tax, problem })?;
    if rate > MAX_TAX_PERCENT {
        return Err(InvoiceError::InvalidTaxRate {
            tax,
            problem: InputProblem::OutOfRange {
                max: MAX_TAX_PERCENT,
            },
        });
    }
    Ok(Some(rate))
}

/// Parses every line, stopping at the first bad one.
///
/// # Errors
///
/// Returns the first line-level error, tagged with its index.
pub fn parse_line_items(raw: &[RawLineItem]) -> Result<Vec<LineItem>, InvoiceError> {
    raw.iter()
        .enumerate()
        .map(|(index, line)| line.parse(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn input(value: serde_json::Value) -> NumericInput {
        serde_json::from_value(value).unwrap()
    }

    #[rstest]
    #[case(json!(2), dec!(2))]
    #[case(json!(2.5), dec!(2.5))]
    #[case(json!("  12.50 "), dec!(12.50))]
    #[case(json!("1.25e1"), dec!(12.5))]
    #[case(json!(0), dec!(0))]
    #[case(json!("-0"), dec!(0))]
    fn test_parse_valid(#[case] raw: serde_json::Value, #[case] expected: Decimal) {
        assert_eq!(input(raw).parse_non_negative().unwrap(), expected);
    }

    #[rstest]
    #[case("1234567.123456789012345", dec!(1234567.123456789012345))]
    #[case("0.1234567890123456789", dec!(0.1234567890123456789))]
    #[case("99999999999999999999.99", dec!(99999999999999999999.99))]
    fn test_number_literal_kept_exact(#[case] literal: &str, #[case] expected: Decimal) {
        let parsed: NumericInput = serde_json::from_str(literal).unwrap();
        assert!(matches!(parsed, NumericInput::Number(_)));
        assert_eq!(parsed.parse().unwrap(), expected);
    }

    #[test]
    fn test_number_literal_in_line_item_kept_exact() {
        let line: RawLineItem = serde_json::from_str(
            r#"{ "description": "Saffron", "quantity": 0.0123456789012345678, "unit_price": 1234567.123456789012345 }"#,
        )
        .unwrap();
        let item = line.parse(0).unwrap();
        assert_eq!(item.quantity, dec!(0.0123456789012345678));
        assert_eq!(item.unit_price, dec!(1234567.123456789012345));
    }

    #[rstest]
    #[case(json!(""))]
    #[case(json!("abc"))]
    #[case(json!("NaN"))]
    #[case(json!("inf"))]
    #[case(json!("-Infinity"))]
    #[case(json!("12,50"))]
    fn test_parse_non_numeric(#[case] raw: serde_json::Value) {
        assert!(matches!(
            input(raw).parse(),
            Err(InputProblem::NonNumeric(_))
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            input(json!(-1)).parse_non_negative(),
            Err(InputProblem::Negative)
        );
        assert_eq!(
            input(json!("-0.01")).parse_non_negative(),
            Err(InputProblem::Negative)
        );
    }

    #[test]
    fn test_raw_line_item_errors_carry_index() {
        let line = RawLineItem {
            description: " Rice ".into(),
            quantity: (-1_i64).into(),
            unit_price: "50".into(),
        };
        let err = line.parse(4).unwrap_err();
        assert_eq!(err.field().as_deref(), Some("items[4].quantity"));

        let line = RawLineItem {
            description: "Rice".into(),
            quantity: 1_i64.into(),
            unit_price: "free".into(),
        };
        let err = line.parse(0).unwrap_err();
        assert!(matches!(
            err,
            InvoiceError::InvalidPrice {
                line: Some(0),
                problem: InputProblem::NonNumeric(_)
            }
        ));
    }

    #[test]
    fn test_parse_line_items_trims_description() {
        let items = parse_line_items(&[RawLineItem {
            description: " Rice ".into(),
            quantity: "2.5".into(),
            unit_price: 40_i64.into(),
        }])
        .unwrap();
        assert_eq!(items, vec![LineItem::new("Rice", dec!(2.5), dec!(40))]);
    }

    #[rstest]
    #[case(json!({ "cgst_percent": 150 }), TaxKind::Cgst)]
    #[case(json!({ "sgst_percent": -5 }), TaxKind::Sgst)]
    #[case(json!({ "igst_percent": "eighteen" }), TaxKind::Igst)]
    fn test_tax_rate_rejected(#[case] raw: serde_json::Value, #[case] tax: TaxKind) {
        let rates: RawTaxRates = serde_json::from_value(raw).unwrap();
        match rates.parse() {
            Err(InvoiceError::InvalidTaxRate { tax: got, .. }) => assert_eq!(got, tax),
            other => panic!("expected InvalidTaxRate, got {other:?}"),
        }
    }

    #[test]
    fn test_tax_rate_boundaries_accepted() {
        let rates: RawTaxRates =
            serde_json::from_value(json!({ "cgst_percent": 0, "sgst_percent": "100" })).unwrap();
        let parsed = rates.parse().unwrap();
        assert_eq!(parsed.cgst_percent, Some(dec!(0)));
        assert_eq!(parsed.sgst_percent, Some(dec!(100)));
        assert_eq!(parsed.igst_percent, None);
    }
}
