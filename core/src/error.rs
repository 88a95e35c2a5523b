//! Error types for the characters core.
//!
//! # Design
//! Upstream 404 is not an error at all (it becomes an empty page), so
//! `UpstreamError` only covers the faults a caller should surface as a
//! backend failure. Store-side "record absent" gets its own variant in
//! `RepositoryError` because callers branch on it.

use thiserror::Error;

use crate::store::StoreError;

/// Failures of a call to the upstream API.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status other than 404.
    #[error("Error fetching {resource}: upstream returned {status}: {message}")]
    Status {
        resource: &'static str,
        status: u16,
        message: String,
    },

    /// The HTTP client failed before any response arrived.
    #[error("Error fetching {resource}: {message}")]
    Transport {
        resource: &'static str,
        message: String,
    },

    /// A 2xx body that does not match the expected page shape.
    #[error("Error decoding {resource}: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },
}

/// Failures of the character record operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Character with ID \"{0}\" not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
