//! Request builder and response classifier for the upstream characters API.
//!
//! # Design
//! `UpstreamClient` holds only a `base_url`. Each lookup is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes the `HttpResponse`, so URL construction and error
//! classification are testable without a network. `fetch_*` glue the two
//! halves over an `HttpTransport`.

use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::error::UpstreamError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{Character, CharacterFilter, Info, Location};

const CHARACTERS: &str = "characters";
const LOCATIONS: &str = "locations";

/// Stateless client for the read-only upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the character search request. Only set filter fields reach the
    /// query string; with none set the URL has no `?` at all.
    pub fn build_fetch_characters(&self, filter: &CharacterFilter) -> HttpRequest {
        let mut url = format!("{}/character", self.base_url);
        let pairs = filter.query_pairs();
        if !pairs.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        tracing::debug!(%url, "built upstream character request");
        get(url)
    }

    pub fn build_fetch_locations(&self) -> HttpRequest {
        get(format!("{}/location", self.base_url))
    }

    pub fn parse_characters(&self, response: HttpResponse) -> Result<Info<Character>, UpstreamError> {
        parse_page(CHARACTERS, response)
    }

    pub fn parse_locations(&self, response: HttpResponse) -> Result<Info<Location>, UpstreamError> {
        parse_page(LOCATIONS, response)
    }

    pub async fn fetch_characters<T>(
        &self,
        transport: &T,
        filter: &CharacterFilter,
    ) -> Result<Info<Character>, UpstreamError>
    where
        T: HttpTransport + ?Sized,
    {
        let request = self.build_fetch_characters(filter);
        let response = execute(CHARACTERS, transport, request).await?;
        self.parse_characters(response)
    }

    pub async fn fetch_locations<T>(&self, transport: &T) -> Result<Info<Location>, UpstreamError>
    where
        T: HttpTransport + ?Sized,
    {
        let request = self.build_fetch_locations();
        let response = execute(LOCATIONS, transport, request).await?;
        self.parse_locations(response)
    }
}

fn get(url: String) -> HttpRequest {
    HttpRequest {
        url,
        headers: vec![("accept".to_string(), "application/json".to_string())],
    }
}

async fn execute<T>(
    resource: &'static str,
    transport: &T,
    request: HttpRequest,
) -> Result<HttpResponse, UpstreamError>
where
    T: HttpTransport + ?Sized,
{
    transport.execute(request).await.map_err(|e| {
        tracing::error!(resource, error = %e, "upstream transport failure");
        UpstreamError::Transport {
            resource,
            message: e.to_string(),
        }
    })
}

/// Upstream answers 404 when a search matched nothing, which is an empty
/// page rather than a fault.
fn parse_page<T: DeserializeOwned>(
    resource: &'static str,
    response: HttpResponse,
) -> Result<Info<T>, UpstreamError> {
    if response.status == 404 {
        tracing::debug!(resource, "upstream reported no matches");
        return Ok(Info::empty());
    }
    if !response.is_success() {
        let message = upstream_message(&response);
        tracing::error!(resource, status = response.status, %message, "upstream request failed");
        return Err(UpstreamError::Status {
            resource,
            status: response.status,
            message,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| UpstreamError::Decode {
        resource,
        message: e.to_string(),
    })
}

/// Prefer upstream's `{"error": "..."}` text, then the raw body.
fn upstream_message(response: &HttpResponse) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
    match from_json {
        Some(message) => message,
        None if !response.body.trim().is_empty() => response.body.trim().to_string(),
        None => format!("status code {}", response.status),
    }
}
