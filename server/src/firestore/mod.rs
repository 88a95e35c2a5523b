//! `DocumentStore` backed by the Firestore REST API.

mod auth;
pub mod value;

use async_trait::async_trait;
use characters_core::store::StoreResult;
use characters_core::{Document, DocumentStore, StoreError, StoredDocument};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

pub use auth::{ServiceAccountAuth, TOKEN_URL};

use crate::config::FirebaseCredentials;

pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: &str = "300";

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("invalid service account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("firestore returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid url: {0}")]
    Url(String),

    #[error("unexpected firestore value: {0}")]
    Value(String),
}

impl From<FirestoreError> for StoreError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::Value(message) => StoreError::Serialization(message),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl WireDocument {
    /// Firestore names documents by full resource path; the id is the last
    /// segment.
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

pub struct FirestoreStore {
    client: Client,
    auth: ServiceAccountAuth,
    documents_url: Url,
}

impl FirestoreStore {
    pub fn new(client: Client, credentials: &FirebaseCredentials) -> Result<Self, FirestoreError> {
        Self::with_endpoints(client, credentials, FIRESTORE_URL, TOKEN_URL)
    }

    pub fn with_endpoints(
        client: Client,
        credentials: &FirebaseCredentials,
        firestore_url: &str,
        token_url: &str,
    ) -> Result<Self, FirestoreError> {
        let auth = ServiceAccountAuth::new(client.clone(), credentials, token_url)?;
        let documents_url = documents_url(firestore_url, &credentials.project_id)?;
        Ok(Self {
            client,
            auth,
            documents_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, FirestoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| FirestoreError::Url(self.documents_url.to_string()))?
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, FirestoreError> {
        let token = self.auth.access_token().await?;
        Ok(request.bearer_auth(token).send().await?)
    }
}

fn documents_url(firestore_url: &str, project_id: &str) -> Result<Url, FirestoreError> {
    let raw = format!(
        "{}/projects/{project_id}/databases/(default)/documents",
        firestore_url.trim_end_matches('/')
    );
    Url::parse(&raw).map_err(|e| FirestoreError::Url(format!("{raw}: {e}")))
}

/// Field paths that are not plain identifiers must be backtick-quoted.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Pull `error.message` out of a Google API error body when there is one.
pub(crate) async fn error_from_response(response: Response) -> FirestoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .get("message")
                .or(error.get("error_description"))
                .or(v.get("error_description"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    FirestoreError::Status { status, message }
}

fn decode_document(document: WireDocument) -> StoreResult<StoredDocument> {
    let id = document.id().to_string();
    let fields = value::decode_fields(document.fields)?;
    Ok(StoredDocument { id, fields })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(&self, collection: &str, fields: Document) -> StoreResult<String> {
        let url = self.url(&[collection])?;
        let body = json!({ "fields": value::encode_fields(fields) });
        let response = self.send(self.client.post(url).json(&body)).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        let document: WireDocument = response.json().await.map_err(FirestoreError::from)?;
        tracing::debug!(collection, id = document.id(), "firestore document added");
        Ok(document.id().to_string())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = self.url(&[collection, id])?;
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        let document: WireDocument = response.json().await.map_err(FirestoreError::from)?;
        Ok(Some(decode_document(document)?.fields))
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        let url = self.url(&[collection, id])?;
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", field_path(k)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));
        let body = json!({ "fields": value::encode_fields(fields) });

        let response = self
            .send(self.client.patch(url).query(&query).json(&body))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await.into());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let url = self.url(&[collection, id])?;
        let response = self.send(self.client.delete(url)).await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(error_from_response(response).await.into());
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let url = self.url(&[collection])?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let response = self
                .send(self.client.get(url.clone()).query(&query))
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await.into());
            }
            let page: ListResponse = response.json().await.map_err(FirestoreError::from)?;
            for document in page.documents {
                documents.push(decode_document(document)?);
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(collection, count = documents.len(), "firestore documents listed");
        Ok(documents)
    }
}
