//! Invoice error types.
//!
//! Every error that can stop a total from being shown or saved lives here.
//! Errors tied to a specific input expose a `field()` path so the form layer
//! can flag the offending input inline.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::TaxKind;

/// What is wrong with a numeric input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputProblem {
    /// Not a finite decimal number (garbage text, `NaN`, `inf`, empty).
    #[error("'{0}' is not a number")]
    NonNumeric(String),

    /// Below zero.
    #[error("value must not be negative")]
    Negative,

    /// Above the permitted maximum.
    #[error("value must not exceed {max}")]
    OutOfRange {
        /// Largest accepted value.
        max: Decimal,
    },
}

/// Errors that can occur while computing, editing, or reading invoices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    // ========== Input Errors ==========
    /// Quantity is negative or not a number.
    #[error("Invalid quantity{}: {problem}", on_line(.line))]
    InvalidQuantity {
        /// Zero-based line index, when known.
        line: Option<usize>,
        /// What is wrong with it.
        problem: InputProblem,
    },

    /// Unit price is negative or not a number.
    #[error("Invalid unit price{}: {problem}", on_line(.line))]
    InvalidPrice {
        /// Zero-based line index, when known.
        line: Option<usize>,
        /// What is wrong with it.
        problem: InputProblem,
    },

    /// A supplied tax rate is negative, not a number, or above 100.
    #[error("Invalid {tax} rate: {problem}")]
    InvalidTaxRate {
        /// Which tax.
        tax: TaxKind,
        /// What is wrong with it.
        problem: InputProblem,
    },

    /// An intermediate amount does not fit in a `Decimal`.
    #[error("Amount is too large to compute")]
    Overflow,

    // ========== Draft Errors ==========
    /// Line item has no description.
    #[error("Line {} must have a description", .line + 1)]
    EmptyDescription {
        /// Zero-based line index.
        line: usize,
    },

    /// Edit refers to a line that does not exist.
    #[error("Line {} does not exist (invoice has {len} lines)", .index + 1)]
    LineNotFound {
        /// Zero-based index requested.
        index: usize,
        /// Number of lines in the draft.
        len: usize,
    },

    /// A field required to finalize the invoice is missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    // ========== Record Errors ==========
    /// A stored figure differs from what its line items and rates produce.
    #[error("Stored {field} ({stored}) does not match computed value ({computed})")]
    TotalsMismatch {
        /// Which total.
        field: &'static str,
        /// Value found in the record.
        stored: Decimal,
        /// Value recomputed from the record's inputs.
        computed: Decimal,
    },

    /// The stored document does not follow the invoice schema.
    #[error("Malformed invoice record: {0}")]
    MalformedRecord(String),
}

fn on_line(line: &Option<usize>) -> String {
    line.map(|i| format!(" on line {}", i + 1)).unwrap_or_default()
}

impl InvoiceError {
    /// Attaches a line index to a line-level error that does not have one yet.
    #[must_use]
    pub fn at_line(self, index: usize) -> Self {
        match self {
            Self::InvalidQuantity { line: None, problem } => Self::InvalidQuantity {
                line: Some(index),
                problem,
            },
            Self::InvalidPrice { line: None, problem } => Self::InvalidPrice {
                line: Some(index),
                problem,
            },
            other => other,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidPrice { .. } => "INVALID_PRICE",
            Self::InvalidTaxRate { .. } => "INVALID_TAX_RATE",
            Self::Overflow => "AMOUNT_OVERFLOW",
            Self::EmptyDescription { .. } => "EMPTY_DESCRIPTION",
            Self::LineNotFound { .. } => "LINE_NOT_FOUND",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::TotalsMismatch { .. } => "TOTALS_MISMATCH",
            Self::MalformedRecord(_) => "MALFORMED_RECORD",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - caller must fix the input
            Self::InvalidQuantity { .. }
            | Self::InvalidPrice { .. }
            | Self::InvalidTaxRate { .. }
            | Self::Overflow
            | Self::EmptyDescription { .. }
            | Self::LineNotFound { .. }
            | Self::MissingField(_) => 400,

            // 422 - stored data is inconsistent
            Self::TotalsMismatch { .. } | Self::MalformedRecord(_) => 422,
        }
    }

    /// Path of the offending input, e.g. `items[1].quantity` or `tax_rates.cgst_percent`.
    #[must_use]
    pub fn field(&self) -> Option<String> {
        match self {
            Self::InvalidQuantity { line, .. } => {
                Some(line.map_or_else(|| "quantity".to_string(), |i| format!("items[{i}].quantity")))
            }
            Self::InvalidPrice { line, .. } => Some(
                line.map_or_else(|| "unit_price".to_string(), |i| format!("items[{i}].unit_price")),
            ),
            Self::InvalidTaxRate { tax, .. } => Some(format!("tax_rates.{}", tax.field_name())),
            Self::EmptyDescription { line } => Some(format!("items[{line}].description")),
            Self::LineNotFound { index, .. } => Some(format!("items[{index}]")),
            Self::MissingField(name) => Some((*name).to_string()),
            Self::TotalsMismatch { field, .. } => Some(format!("totals.{field}")),
            Self::Overflow | Self::MalformedRecord(_) => None,
        }
    }
}

impl From<InvoiceError> for khata_shared::AppError {
    fn from(err: InvoiceError) -> Self {
        match err.http_status_code() {
            422 => Self::BusinessRule(err.to_string()),
            _ => Self::Validation {
                code: err.error_code(),
                field: err.field(),
                message: err.to_string(),
            },
        }
    }
}
