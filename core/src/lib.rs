//! Data-access core for the characters service.
//!
//! # Overview
//! Two components, both free of network code:
//! - `UpstreamClient` turns a `CharacterFilter` into a request against the
//!   read-only upstream API and classifies its responses, treating 404 as an
//!   empty page.
//! - `CharacterRepository` implements record CRUD with creation defaults and
//!   shallow-merge updates on top of any `DocumentStore`.
//!
//! # Design
//! - I/O happens behind two ports: `HttpTransport` for upstream calls and
//!   `DocumentStore` for persistence. The server crate supplies the real
//!   implementations; tests use the in-memory store and scripted transports.
//! - Nothing is cached between calls.

pub mod client;
pub mod error;
pub mod http;
pub mod repository;
pub mod store;
pub mod types;

pub use client::UpstreamClient;
pub use error::{RepositoryError, UpstreamError};
pub use http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
pub use repository::CharacterRepository;
pub use store::{Document, DocumentStore, InMemoryDocumentStore, StoreError, StoredDocument};
pub use types::{
    Character, CharacterFilter, CharacterPatch, DeleteResult, Gender, Info, Location, PageInfo,
    Reference, Status,
};
