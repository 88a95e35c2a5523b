//! DocumentStore trait definition

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A document body: field name to JSON value. The document id is not part
/// of the body.
pub type Document = Map<String, Value>;

/// A document body together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A write targeted a document that does not exist.
    #[error("document {collection}/{id} does not exist")]
    Missing { collection: String, id: String },

    /// A document could not be converted to or from its stored form.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing service failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// DocumentStore trait - CRUD over named collections of schemaless documents
///
/// This trait allows the managed document database and the in-memory store
/// to be swapped without changing the record logic built on top.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the id the store assigned.
    async fn add(&self, collection: &str, fields: Document) -> StoreResult<String>;

    /// Fetch a document body, `None` if no document has that id.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Overwrite the given top-level fields of an existing document, leaving
    /// the others untouched. Fails with `StoreError::Missing` if the
    /// document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()>;

    /// Remove a document. Removing an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Every document in the collection, in store-defined order.
    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>>;
}
