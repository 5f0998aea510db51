//! The document store contract shared by every backend.

use async_trait::async_trait;
use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

use khata_shared::{AppError, OwnerKey};

/// Longest accepted collection name.
pub const MAX_COLLECTION_LEN: usize = 64;

/// Longest accepted document id.
pub const MAX_DOCUMENT_ID_LEN: usize = 128;

/// Errors that can occur in a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A document with this id already exists.
    #[error("Document '{id}' already exists in '{collection}'")]
    Conflict {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
    },

    /// Collection name or document id is not acceptable.
    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    /// Document bodies must be JSON objects.
    #[error("Document body must be a JSON object")]
    NotAnObject,

    /// Backend failure.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::InvalidKey(_) | StoreError::NotAnObject => Self::Internal(err.to_string()),
            StoreError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A document as returned by [`DocumentStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Document id.
    pub id: String,
    /// Document body.
    pub body: Value,
}

/// One page of a collection plus the collection size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    /// Documents in id order.
    pub documents: Vec<StoredDocument>,
    /// Number of documents in the whole collection.
    pub total: u64,
}

/// Schemaless JSON documents partitioned by owner and collection.
///
/// Every operation takes the owner explicitly; there is no way to reach
/// another owner's documents through this trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the id is already taken.
    async fn create(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError>;

    /// Inserts or replaces a document.
    async fn save(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError>;

    /// Fetches a document by id.
    async fn get(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError>;

    /// Lists documents ordered by id.
    async fn list(
        &self,
        owner: &OwnerKey,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DocumentPage, StoreError>;

    /// Deletes a document, returning whether it existed.
    async fn delete(&self, owner: &OwnerKey, collection: &str, id: &str)
    -> Result<bool, StoreError>;
}

/// Checks a collection name and document id before they reach a backend.
///
/// Collections are lowercase identifiers (`[a-z][a-z0-9_]*`); ids are
/// non-empty, printable, and contain no `/`.
///
/// # Errors
///
/// Returns `InvalidKey` describing the first problem.
pub fn validate_key(collection: &str, id: &str) -> Result<(), StoreError> {
    validate_collection(collection)?;

    if id.is_empty() {
        return Err(StoreError::InvalidKey("document id is empty".to_string()));
    }
    if id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(StoreError::InvalidKey(format!(
            "document id longer than {MAX_DOCUMENT_ID_LEN} bytes"
        )));
    }
    if id.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control()) {
        return Err(StoreError::InvalidKey(format!("document id '{id}'")));
    }
    Ok(())
}

/// Checks a collection name.
///
/// # Errors
///
/// Returns `InvalidKey` if the name is not a lowercase identifier.
pub fn validate_collection(collection: &str) -> Result<(), StoreError> {
    let mut chars = collection.chars();
    let valid = collection.len() <= MAX_COLLECTION_LEN
        && chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!("collection '{collection}'")))
    }
}

/// Checks that a body is a JSON object.
///
/// # Errors
///
/// Returns `NotAnObject` otherwise.
pub fn validate_body(body: &Value) -> Result<(), StoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}
