//! # HTTP Boundary
//!
//! Scenes never construct requests or parse transport errors; they talk
//! to an injected [`HttpClient`] and receive either a JSON value or an
//! [`ApiError`]. What implements the trait is the embedder's business: a
//! real client in production, [`MockApi`](crate::MockApi) or a stub
//! backend in tests and demos.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A failed API call, normalized across transports.
///
/// `status` carries the HTTP status code, or `0` when the request never
/// produced a response (network failure, malformed payload). `code` is
/// the machine-readable error identifier servers put in rejection bodies;
/// scenes match on it to route errors to form fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} ({status}): {detail}")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: u16, code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { status, code: code.into(), detail: detail.into() }
    }

    /// A request that never reached the server.
    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(0, "network_error", detail)
    }

    /// A response body that did not decode into the expected shape.
    pub fn invalid_payload(detail: impl Into<String>) -> Self {
        Self::new(0, "invalid_payload", detail)
    }
}

/// Asynchronous JSON API access, as scenes see it.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetches `path`. The path carries its own query string.
    async fn get(&self, path: &str) -> Result<Value, ApiError>;

    /// Creates or submits at `path` with a JSON `body`.
    async fn create(&self, path: &str, body: Value) -> Result<Value, ApiError>;
}

/// Decodes a response value into a typed payload, folding serde failures
/// into [`ApiError::invalid_payload`]. Loaders chain this after a fetch:
///
/// ```rust,ignore
/// api.get("/api/projects").await.and_then(decode::<Vec<Project>>)
/// ```
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::invalid_payload(err.to_string()))
}
