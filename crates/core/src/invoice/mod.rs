//! Invoice computation and records.
//!
//! This module implements the invoice core:
//! - Domain types for line items, GST rates, and totals
//! - The totals calculator (the only place totals are derived)
//! - Parsing of user-entered numbers
//! - Editing drafts driven by explicit actions
//! - Persisted records validated on read
//! - Error types for all of the above

pub mod calculator;
pub mod draft;
pub mod error;
pub mod numeric;
pub mod record;
pub mod types;

#[cfg(test)]
mod calculator_props;

pub use calculator::{
    calculate, compute_grand_total, compute_line_total, compute_subtotal, compute_tax_breakdown,
};
pub use draft::{DraftAction, InvoiceDraft};
pub use error::{InputProblem, InvoiceError};
pub use numeric::{NumericInput, RawLineItem, RawTaxRates, parse_line_items};
pub use record::{CURRENT_SCHEMA_VERSION, InvoiceRecord};
pub use types::{CustomerInfo, InvoiceTotals, LineItem, TaxBreakdown, TaxKind, TaxMode, TaxRates};
