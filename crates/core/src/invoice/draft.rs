//! Invoice drafts: the transient state of one editing session.
//!
//! A draft is an immutable value. Each edit is expressed as a
//! [`DraftAction`] and applied with [`InvoiceDraft::apply`], which returns a
//! new draft. Totals are never stored on the draft; they are recomputed from
//! its current lines and rates whenever they are asked for.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use khata_shared::types::{Currency, InvoiceId};

use super::calculator::calculate;
use super::error::InvoiceError;
use super::record::{CURRENT_SCHEMA_VERSION, InvoiceRecord};
use super::types::{CustomerInfo, InvoiceTotals, LineItem, TaxRates};

/// A single edit to a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DraftAction {
    /// Sets the invoice number.
    SetInvoiceNumber(String),
    /// Sets who is billed.
    SetCustomer(CustomerInfo),
    /// Sets the issue date.
    SetIssueDate(NaiveDate),
    /// Sets free-form notes; `None` clears them.
    SetNotes(Option<String>),
    /// Sets the invoice currency.
    SetCurrency(Currency),
    /// Appends a line.
    AddItem(LineItem),
    /// Replaces the line at `index`.
    UpdateItem {
        /// Zero-based line index.
        index: usize,
        /// Replacement line.
        item: LineItem,
    },
    /// Removes the line at `index`.
    RemoveItem(usize),
    /// Replaces the tax rates.
    SetTaxRates(TaxRates),
}

/// Form state for an invoice that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    invoice_number: String,
    customer: CustomerInfo,
    issue_date: NaiveDate,
    currency: Currency,
    items: Vec<LineItem>,
    tax_rates: TaxRates,
    notes: Option<String>,
}

impl InvoiceDraft {
    /// Starts an empty draft dated `issue_date`.
    #[must_use]
    pub fn new(issue_date: NaiveDate) -> Self {
        Self {
            invoice_number: String::new(),
            customer: CustomerInfo::default(),
            issue_date,
            currency: Currency::default(),
            items: Vec::new(),
            tax_rates: TaxRates::none(),
            notes: None,
        }
    }

    /// Applies one edit, returning the updated draft.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` when an edit targets a missing line.
    pub fn apply(&self, action: DraftAction) -> Result<Self, InvoiceError> {
        let mut next = self.clone();
        match action {
            DraftAction::SetInvoiceNumber(number) => next.invoice_number = number.trim().to_string(),
            DraftAction::SetCustomer(customer) => next.customer = customer,
            DraftAction::SetIssueDate(date) => next.issue_date = date,
            DraftAction::SetNotes(notes) => {
                next.notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            }
            DraftAction::SetCurrency(currency) => next.currency = currency,
            DraftAction::AddItem(item) => next.items.push(item),
            DraftAction::UpdateItem { index, item } => {
                let len = next.items.len();
                let slot = next
                    .items
                    .get_mut(index)
                    .ok_or(InvoiceError::LineNotFound { index, len })?;
                *slot = item;
            }
            DraftAction::RemoveItem(index) => {
                if index >= next.items.len() {
                    return Err(InvoiceError::LineNotFound {
                        index,
                        len: next.items.len(),
                    });
                }
                next.items.remove(index);
            }
            DraftAction::SetTaxRates(rates) => next.tax_rates = rates,
        }
        Ok(next)
    }

    /// Applies a sequence of edits in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first edit error.
    pub fn apply_all<I>(&self, actions: I) -> Result<Self, InvoiceError>
    where
        I: IntoIterator<Item = DraftAction>,
    {
        actions
            .into_iter()
            .try_fold(self.clone(), |draft, action| draft.apply(action))
    }

    /// Current totals, recomputed from the draft's lines and rates.
    ///
    /// # Errors
    ///
    /// Returns the calculator's error for the first invalid input.
    pub fn totals(&self) -> Result<InvoiceTotals, InvoiceError> {
        calculate(&self.items, &self.tax_rates)
    }

    /// Turns this snapshot into a record ready to persist.
    ///
    /// The record's totals are computed from exactly the lines and rates
    /// it carries.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` / `EmptyDescription` for incomplete drafts and
    /// any calculator error.
    pub fn finalize(&self, id: InvoiceId, created_at: DateTime<Utc>) -> Result<InvoiceRecord, InvoiceError> {
        if self.invoice_number.is_empty() {
            return Err(InvoiceError::MissingField("invoice_number"));
        }
        if self.customer.name.trim().is_empty() {
            return Err(InvoiceError::MissingField("customer.name"));
        }
        if self.items.is_empty() {
            return Err(InvoiceError::MissingField("items"));
        }
        if let Some(line) = self
            .items
            .iter()
            .position(|item| item.description.trim().is_empty())
        {
            return Err(InvoiceError::EmptyDescription { line });
        }

        let totals = self.totals()?;

        Ok(InvoiceRecord {
            schema_version: CURRENT_SCHEMA_VERSION,
            id,
            invoice_number: self.invoice_number.clone(),
            customer: self.customer.clone(),
            issue_date: self.issue_date,
            currency: self.currency,
            items: self.items.clone(),
            tax_rates: self.tax_rates,
            totals,
            notes: self.notes.clone(),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn filled_draft() -> InvoiceDraft {
        InvoiceDraft::new(date())
            .apply_all([
                DraftAction::SetInvoiceNumber(" INV-001 ".into()),
                DraftAction::SetCustomer(CustomerInfo {
                    name: "Sharma Traders".into(),
                    gstin: Some("27AAAPL1234C1ZV".into()),
                    ..CustomerInfo::default()
                }),
                DraftAction::AddItem(LineItem::new("Widget", dec!(2), dec!(100))),
                DraftAction::AddItem(LineItem::new("Gadget", dec!(1), dec!(50))),
            ])
            .unwrap()
    }

    #[test]
    fn test_apply_returns_new_draft() {
        let empty = InvoiceDraft::new(date());
        let next = empty
            .apply(DraftAction::AddItem(LineItem::new("Widget", dec!(1), dec!(10))))
            .unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(next.items.len(), 1);
    }

    #[test]
    fn test_totals_follow_every_edit() {
        let draft = filled_draft();
        assert_eq!(draft.totals().unwrap().grand_total(), dec!(250));

        let taxed = draft
            .apply(DraftAction::SetTaxRates(TaxRates::intrastate(dec!(9), dec!(9))))
            .unwrap();
        assert_eq!(taxed.totals().unwrap().grand_total(), dec!(295));

        let edited = taxed
            .apply(DraftAction::UpdateItem {
                index: 1,
                item: LineItem::new("Gadget", dec!(3), dec!(50)),
            })
            .unwrap();
        assert_eq!(edited.totals().unwrap().subtotal(), dec!(350));

        let removed = edited.apply(DraftAction::RemoveItem(0)).unwrap();
        assert_eq!(removed.totals().unwrap().subtotal(), dec!(150));
    }

    #[test]
    fn test_invalid_line_blocks_totals_but_not_editing() {
        let draft = filled_draft()
            .apply(DraftAction::AddItem(LineItem::new("Refund", dec!(-1), dec!(5))))
            .unwrap();
        let err = draft.totals().unwrap_err();
        assert_eq!(err.field().as_deref(), Some("items[2].quantity"));

        let fixed = draft.apply(DraftAction::RemoveItem(2)).unwrap();
        assert!(fixed.totals().is_ok());
    }

    #[test]
    fn test_edit_out_of_range() {
        let draft = filled_draft();
        assert_eq!(
            draft.apply(DraftAction::RemoveItem(5)).unwrap_err(),
            InvoiceError::LineNotFound { index: 5, len: 2 }
        );
        assert!(matches!(
            draft.apply(DraftAction::UpdateItem {
                index: 2,
                item: LineItem::new("x", dec!(1), dec!(1)),
            }),
            Err(InvoiceError::LineNotFound { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_finalize_snapshots_totals() {
        let draft = filled_draft()
            .apply(DraftAction::SetTaxRates(TaxRates::interstate(dec!(18))))
            .unwrap();
        let id = InvoiceId::new();
        let record = draft.finalize(id, Utc::now()).unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.invoice_number, "INV-001");
        assert_eq!(record.totals, draft.totals().unwrap());
        assert_eq!(record.totals.igst_amount(), dec!(45));
    }

    #[test]
    fn test_finalize_requires_fields() {
        let now = Utc::now();
        let empty = InvoiceDraft::new(date());
        assert_eq!(
            empty.finalize(InvoiceId::new(), now).unwrap_err(),
            InvoiceError::MissingField("invoice_number")
        );

        let numbered = empty
            .apply(DraftAction::SetInvoiceNumber("INV-9".into()))
            .unwrap();
        assert_eq!(
            numbered.finalize(InvoiceId::new(), now).unwrap_err(),
            InvoiceError::MissingField("customer.name")
        );

        let no_items = filled_draft()
            .apply_all([DraftAction::RemoveItem(0), DraftAction::RemoveItem(0)])
            .unwrap();
        assert_eq!(
            no_items.finalize(InvoiceId::new(), now).unwrap_err(),
            InvoiceError::MissingField("items")
        );

        let unnamed = filled_draft()
            .apply(DraftAction::AddItem(LineItem::new("  ", dec!(1), dec!(1))))
            .unwrap();
        assert_eq!(
            unnamed.finalize(InvoiceId::new(), now).unwrap_err(),
            InvoiceError::EmptyDescription { line: 2 }
        );
    }

    #[test]
    fn test_notes_are_trimmed_and_cleared() {
        let draft = filled_draft()
            .apply(DraftAction::SetNotes(Some("   ".into())))
            .unwrap();
        let record = draft.finalize(InvoiceId::new(), Utc::now()).unwrap();
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_action_serde_shape() {
        let action: DraftAction =
            serde_json::from_value(serde_json::json!({ "type": "remove_item", "payload": 1 }))
                .unwrap();
        assert_eq!(action, DraftAction::RemoveItem(1));
    }
}
