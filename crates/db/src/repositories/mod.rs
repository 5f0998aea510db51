//! Repository abstractions for data access.
//!
//! [`DocumentStore`] is the storage seam: a schemaless per-owner document
//! store with a Postgres and an in-memory backend. Typed repositories sit on
//! top of it and validate what they read back.

pub mod document;
pub mod invoice;
pub mod memory_document;
pub mod pg_document;

pub use document::{DocumentPage, DocumentStore, StoreError, StoredDocument};
pub use invoice::{INVOICES_COLLECTION, InvoiceRepository, InvoiceRepositoryError};
pub use memory_document::MemoryDocumentStore;
pub use pg_document::PgDocumentStore;
