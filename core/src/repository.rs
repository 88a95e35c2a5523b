//! Character records kept in a document store.
//!
//! # Design
//! `CharacterRepository` owns the CRUD rules: creation defaults, existence
//! checks before every id-addressed operation, and shallow merges on update.
//! It talks to storage only through `DocumentStore`, so the same logic runs
//! against the managed database and the in-memory store. There is no
//! compare-and-swap: two concurrent updates to one record are
//! last-write-wins at the store.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::error::RepositoryError;
use crate::store::{Document, DocumentStore, StoreError};
use crate::types::{Character, CharacterPatch, DeleteResult};

pub const COLLECTION: &str = "characters";

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Clone)]
pub struct CharacterRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CharacterRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_collection(store, COLLECTION)
    }

    pub fn with_collection(store: Arc<dyn DocumentStore>, collection: &str) -> Self {
        Self {
            store,
            collection: collection.to_string(),
        }
    }

    /// Insert a new record. Omitted fields get their defaults, `url` is
    /// cleared and `created` is stamped now whatever the caller sent. The
    /// defaulted record is what gets stored, so later reads return the same
    /// values.
    pub async fn create(&self, patch: CharacterPatch) -> Result<Character> {
        let mut character = patch.into_character(now_iso8601());
        let fields = to_document(&character)?;
        character.id = self.store.add(&self.collection, fields).await?;
        tracing::info!(id = %character.id, name = %character.name, "character created");
        Ok(character)
    }

    /// Every stored record. A document that cannot be read as a character
    /// is logged and left out rather than failing the whole listing.
    pub async fn get_all(&self) -> Result<Vec<Character>> {
        let documents = self.store.list(&self.collection).await?;
        let characters = documents
            .into_iter()
            .filter_map(|d| match from_document(&d.id, d.fields) {
                Ok(character) => Some(character),
                Err(e) => {
                    tracing::warn!(id = %d.id, error = %e, "skipping unreadable character");
                    None
                }
            })
            .collect();
        Ok(characters)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Character> {
        let fields = self.snapshot(id).await?;
        from_document(id, fields)
    }

    /// Overlay the patch onto the stored record.
    ///
    /// The returned value is the pre-write snapshot merged with the patch,
    /// not a re-read after the write. Anything the store itself changes
    /// during the write is not reflected.
    pub async fn update(&self, id: &str, patch: CharacterPatch) -> Result<Character> {
        let mut fields = self.snapshot(id).await?;
        let changes = to_document(&patch)?;
        if !changes.is_empty() {
            self.store
                .update(&self.collection, id, changes.clone())
                .await
                .map_err(|e| match e {
                    StoreError::Missing { .. } => RepositoryError::NotFound(id.to_string()),
                    other => other.into(),
                })?;
        }
        fields.extend(changes);
        tracing::info!(%id, "character updated");
        from_document(id, fields)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteResult> {
        self.snapshot(id).await?;
        self.store.delete(&self.collection, id).await?;
        tracing::info!(%id, "character deleted");
        Ok(DeleteResult { success: true })
    }

    async fn snapshot(&self, id: &str) -> Result<Document> {
        match self.store.get(&self.collection, id).await? {
            Some(fields) => Ok(fields),
            None => {
                tracing::warn!(%id, "character not found");
                Err(RepositoryError::NotFound(id.to_string()))
            }
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut map)) => {
            map.remove("id");
            Ok(map)
        }
        Ok(other) => Err(StoreError::Serialization(format!("expected an object, got {other}")).into()),
        Err(e) => Err(StoreError::Serialization(e.to_string()).into()),
    }
}

fn from_document(id: &str, mut fields: Document) -> Result<Character> {
    fields.insert("id".to_string(), Value::String(id.to_string()));
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| StoreError::Serialization(format!("document {id}: {e}")).into())
}
