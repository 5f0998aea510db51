//! Postgres document store backed by the `documents` table.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use serde_json::Value;

use khata_shared::OwnerKey;

use super::document::{
    DocumentPage, DocumentStore, StoreError, StoredDocument, validate_body, validate_collection,
    validate_key,
};
use crate::entities::documents;

/// [`DocumentStore`] over `SeaORM` and Postgres JSONB.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    db: DatabaseConnection,
}

impl PgDocumentStore {
    /// Creates a new store on an existing connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn row(owner: &OwnerKey, collection: &str, id: &str, body: Value) -> documents::ActiveModel {
        let now = chrono::Utc::now().into();
        documents::ActiveModel {
            owner_key: Set(owner.as_str().to_string()),
            collection: Set(collection.to_string()),
            document_id: Set(id.to_string()),
            body: Set(body),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    fn primary_key(owner: &OwnerKey, collection: &str, id: &str) -> (String, String, String) {
        (
            owner.as_str().to_string(),
            collection.to_string(),
            id.to_string(),
        )
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        validate_key(collection, id)?;
        validate_body(&body)?;

        let result = documents::Entity::insert(Self::row(owner, collection, id, body))
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
            Err(err) => Err(err.into()),
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

        documents::Entity::insert(Self::row(owner, collection, id, body))
            .on_conflict(
                OnConflict::columns([
                    documents::Column::OwnerKey,
                    documents::Column::Collection,
                    documents::Column::DocumentId,
                ])
                .update_columns([documents::Column::Body, documents::Column::UpdatedAt])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn get(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        validate_key(collection, id)?;

        let row = documents::Entity::find_by_id(Self::primary_key(owner, collection, id))
            .one(&self.db)
            .await?;
        Ok(row.map(|model| model.body))
    }

    async fn list(
        &self,
        owner: &OwnerKey,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<DocumentPage, StoreError> {
        validate_collection(collection)?;

        let query = documents::Entity::find()
            .filter(documents::Column::OwnerKey.eq(owner.as_str()))
            .filter(documents::Column::Collection.eq(collection));

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(documents::Column::DocumentId)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(DocumentPage {
            documents: rows
                .into_iter()
                .map(|model| StoredDocument {
                    id: model.document_id,
                    body: model.body,
                })
                .collect(),
            total,
        })
    }

    async fn delete(
        &self,
        owner: &OwnerKey,
        collection: &str,
        id: &str,
    ) -> Result<bool, StoreError> {
        validate_key(collection, id)?;

        let result = documents::Entity::delete_by_id(Self::primary_key(owner, collection, id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
