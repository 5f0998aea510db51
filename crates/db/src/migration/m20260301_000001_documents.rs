//! Documents migration.
//!
//! Creates the per-owner document table backing every collection.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS documents CASCADE;")
            .await?;
        Ok(())
    }
}

const DOCUMENTS_SQL: &str = r"
-- One row per (owner, collection, document); bodies are schemaless JSON
CREATE TABLE documents (
    owner_key VARCHAR(320) NOT NULL,
    collection VARCHAR(64) NOT NULL,
    document_id VARCHAR(128) NOT NULL,
    body JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (owner_key, collection, document_id),
    CONSTRAINT chk_documents_owner_lowercase CHECK (owner_key = lower(owner_key)),
    CONSTRAINT chk_documents_body_object CHECK (jsonb_typeof(body) = 'object')
);

-- Recency queries per collection
CREATE INDEX idx_documents_recent ON documents(owner_key, collection, updated_at DESC);
";
