//! Persisted invoice records.
//!
//! The document store imposes no schema, so records are parsed and checked
//! on the way in: the shape must match, the schema version must be known,
//! and the stored totals must equal what the stored lines and rates produce.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use khata_shared::types::{Currency, InvoiceId};

use super::calculator::calculate;
use super::error::InvoiceError;
use super::types::{CustomerInfo, InvoiceTotals, LineItem, TaxRates};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// A finalized invoice. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceRecord {
    /// Record layout version.
    pub schema_version: u32,
    /// Document id.
    pub id: InvoiceId,
    /// Human-facing invoice number.
    pub invoice_number: String,
    /// Billed customer.
    pub customer: CustomerInfo,
    /// Date printed on the invoice.
    pub issue_date: NaiveDate,
    /// Invoice currency.
    #[serde(default)]
    pub currency: Currency,
    /// Line items.
    pub items: Vec<LineItem>,
    /// Tax rates charged.
    pub tax_rates: TaxRates,
    /// Totals computed from `items` and `tax_rates` at finalization.
    pub totals: InvoiceTotals,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the record was finalized.
    pub created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    /// Parses a stored document and checks it against the schema.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` for unknown versions, wrong shapes, or
    /// unusable stored numbers, and `TotalsMismatch` when stored totals
    /// disagree with the stored lines.
    pub fn from_document(document: Value) -> Result<Self, InvoiceError> {
        match document.get("schema_version").and_then(Value::as_u64) {
            Some(v) if v == u64::from(CURRENT_SCHEMA_VERSION) => {}
            Some(v) => {
                return Err(InvoiceError::MalformedRecord(format!(
                    "unsupported schema_version {v}"
                )));
            }
            None => {
                return Err(InvoiceError::MalformedRecord(
                    "missing schema_version".to_string(),
                ));
            }
        }

        let record: Self = serde_json::from_value(document)
            .map_err(|e| InvoiceError::MalformedRecord(e.to_string()))?;
        record.verify()?;
        Ok(record)
    }

    /// Serializes the record for storage.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRecord` if serialization fails.
    pub fn to_document(&self) -> Result<Value, InvoiceError> {
        serde_json::to_value(self).map_err(|e| InvoiceError::MalformedRecord(e.to_string()))
    }

    /// Recomputes the totals and compares them with the stored ones.
    ///
    /// # Errors
    ///
    /// Returns `TotalsMismatch` on the first differing figure, or
    /// `MalformedRecord` if the stored inputs cannot be computed at all.
    pub fn verify(&self) -> Result<(), InvoiceError> {
        let computed = calculate(&self.items, &self.tax_rates)
            .map_err(|e| InvoiceError::MalformedRecord(e.to_string()))?;

        for ((field, stored), (_, expected)) in self.totals.fields().into_iter().zip(computed.fields()) {
            if stored != expected {
                return Err(InvoiceError::TotalsMismatch {
                    field,
                    stored,
                    computed: expected,
                });
            }
        }
        Ok(())
    }
}
