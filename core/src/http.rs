//! HTTP transport types for the upstream API.
//!
//! # Design
//! Requests and responses are plain data. `UpstreamClient` builds an
//! `HttpRequest` and classifies the `HttpResponse` it gets back; the
//! `HttpTransport` port performs the round-trip in between. Non-2xx statuses
//! come back as ordinary responses, only failures to talk to the server at
//! all are `TransportError`s.

use async_trait::async_trait;
use thiserror::Error;

/// A GET request described as plain data. `url` already carries the
/// encoded query string, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (DNS, connect, TLS, timeout, ...).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes an `HttpRequest` against the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
