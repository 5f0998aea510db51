//! In-memory document store for development and tests.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use khata_shared::OwnerKey;

use super::document::{
    DocumentPage, DocumentStore, StoreError, StoredDocument, validate_body, validate_collection,
    validate_key,
};

type CollectionKey = (OwnerKey, String);

/// Process-local [`DocumentStore`].
///
/// Each `(owner, collection)` pair maps to a `BTreeMap`, so listing is in id
/// order without sorting. Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<DashMap<CollectionKey, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(owner: &OwnerKey, collection: &str) -> CollectionKey {
        (owner.clone(), collection.to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        validate_key(collection, id)?;
        validate_body(&body)?;

        let mut documents = self
            .collections
            .entry(Self::key(owner, collection))
            .or_default();
        match documents.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(body);
                Ok(())
            }
        }
    }

    async fn save(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        validate_key(collection, id)?;
        validate_body(&body)?;

        self.collections
            .entry(Self::key(owner, collection))
            .or_default()
            .insert(id.to_string(), body);
        Ok(())
    }

    async fn get(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        validate_key(collection, id)?;

        Ok(self
            .collections
            .get(&Self::key(owner, collection))
            .and_then(|documents| documents.get(id).cloned()))
    }

    async fn list(
        &self,
        owner: &OwnerKey,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DocumentPage, StoreError> {
        validate_collection(collection)?;

        let Some(documents) = self.collections.get(&Self::key(owner, collection)) else {
            return Ok(DocumentPage {
                documents: Vec::new(),
                total: 0,
            });
        };

        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let page = documents
            .iter()
            .skip(skip)
            .take(take)
            .map(|(id, body)| StoredDocument {
                id: id.clone(),
                body: body.clone(),
            })
            .collect();

        Ok(DocumentPage {
            documents: page,
            total: documents.len() as u64,
        })
    }

    async fn delete(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
    ) -> Result<bool, StoreError> {
        validate_key(collection, id)?;

        Ok(self
            .collections
            .get_mut(&Self::key(owner, collection))
            .is_some_and(|mut documents| documents.remove(id).is_some()))
    }
}
