//! Invoice repository over a [`DocumentStore`].
//!
//! Records are written once and never updated. Everything read back is
//! parsed and re-verified with [`InvoiceRecord::from_document`], so a
//! hand-edited or half-migrated document surfaces as an error instead of a
//! wrong total.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use khata_core::invoice::{InvoiceError, InvoiceRecord};
use khata_shared::types::{InvoiceId, OwnerKey, PageRequest, PageResponse};
use khata_shared::AppError;

use super::document::{DocumentStore, StoreError};

/// Collection holding finalized invoices.
pub const INVOICES_COLLECTION: &str = "invoices";

/// Errors that can occur in invoice persistence.
#[derive(Debug, Error)]
pub enum InvoiceRepositoryError {
    /// An invoice with this id is already stored.
    #[error("Invoice {0} already exists")]
    AlreadyExists(InvoiceId),

    /// The record was refused before writing.
    #[error("Invoice rejected: {0}")]
    Rejected(#[from] InvoiceError),

    /// A stored document failed validation on read.
    #[error("Stored invoice '{id}' is invalid: {source}")]
    Corrupt {
        /// Document id.
        id: String,
        /// What failed.
        #[source]
        source: InvoiceError,
    },

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<InvoiceRepositoryError> for AppError {
    fn from(err: InvoiceRepositoryError) -> Self {
        match err {
            InvoiceRepositoryError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            InvoiceRepositoryError::Rejected(e) => e.into(),
            InvoiceRepositoryError::Corrupt { .. } => Self::BusinessRule(err.to_string()),
            InvoiceRepositoryError::Store(e) => e.into(),
        }
    }
}

/// Typed access to an owner's invoices.
#[derive(Clone)]
pub struct InvoiceRepository {
    store: Arc<dyn DocumentStore>,
}

impl InvoiceRepository {
    /// Creates a repository on top of `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persists a finalized record.
    ///
    /// The record is verified before writing, so stored totals always match
    /// stored lines.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the id is taken, `Rejected` if the record
    /// does not verify, or a store error.
    pub async fn create(
        &self,
        owner: &OwnerKey,
        record: &InvoiceRecord,
    ) -> Result<(), InvoiceRepositoryError> {
        record.verify()?;
        let document = record.to_document()?;
        let id = record.id.to_string();

        match self
            .store
            .create(owner, INVOICES_COLLECTION, &id, document)
            .await
        {
            Ok(()) => {
                debug!(owner = %owner, invoice_id = %id, "Invoice stored");
                Ok(())
            }
            Err(StoreError::Conflict { .. }) => Err(InvoiceRepositoryError::AlreadyExists(record.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches and validates one record.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if the stored document does not validate, or a
    /// store error.
    pub async fn get(
        &self,
        owner: &OwnerKey,
        id: InvoiceId,
    ) -> Result<Option<InvoiceRecord>, InvoiceRepositoryError> {
        let id = id.to_string();
        let Some(document) = self.store.get(owner, INVOICES_COLLECTION, &id).await? else {
            return Ok(None);
        };
        decode(owner, &id, document).map(Some)
    }

    /// Lists records in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for the first stored document on the page that
    /// does not validate, or a store error.
    pub async fn list(
        &self,
        owner: &OwnerKey,
        request: PageRequest,
    ) -> Result<PageResponse<InvoiceRecord>, InvoiceRepositoryError> {
        let page = self
            .store
            .list(owner, INVOICES_COLLECTION, request.offset(), request.limit())
            .await?;

        let records = page
            .documents
            .into_iter()
            .map(|doc| decode(owner, &doc.id, doc.body))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(records, request, page.total))
    }

    /// Deletes a record, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn delete(&self, owner: &OwnerKey, id: InvoiceId) -> Result<bool, InvoiceRepositoryError> {
        let deleted = self
            .store
            .delete(owner, INVOICES_COLLECTION, &id.to_string())
            .await?;
        if deleted {
            debug!(owner = %owner, invoice_id = %id, "Invoice deleted");
        }
        Ok(deleted)
    }
}

fn decode(
    owner: &OwnerKey,
    id: &str,
    document: serde_json::Value,
) -> Result<InvoiceRecord, InvoiceRepositoryError> {
    let record = InvoiceRecord::from_document(document).and_then(|record| {
        if record.id.to_string() == id {
            Ok(record)
        } else {
            Err(InvoiceError::MalformedRecord(format!(
                "body id {} does not match document id",
                record.id
            )))
        }
    });

    record.map_err(|source| {
        warn!(owner = %owner, invoice_id = %id, error = %source, "Stored invoice failed validation");
        InvoiceRepositoryError::Corrupt {
            id: id.to_string(),
            source,
        }
    })
}
