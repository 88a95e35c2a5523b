//! In-memory document store implementation

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::traits::{Document, DocumentStore, StoreError, StoreResult, StoredDocument};

type Collection = BTreeMap<String, Document>;

/// In-memory document store for testing and development
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add(&self, collection: &str, fields: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id).cloned()))
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        document.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        if let Some(c) = self.collections.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| StoredDocument {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
