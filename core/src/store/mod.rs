//! Storage port and its in-memory implementation.

pub mod memory;
pub mod traits;

pub use memory::InMemoryDocumentStore;
pub use traits::{Document, DocumentStore, StoreError, StoreResult, StoredDocument};
