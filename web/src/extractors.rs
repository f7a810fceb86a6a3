//! Custom Axum extractors.
//!
//! ```ignore
//! use inscriptions_web::extractors::CorrelationId;
//!
//! async fn handler(correlation_id: CorrelationId) -> Result<Json<Body>, AppError> {
//!     tracing::info!(%correlation_id, "Processing request");
//!     Ok(Json(body))
//! }
//! ```

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use std::fmt;
use uuid::Uuid;

/// Longest client-supplied correlation id that is echoed back.
pub const MAX_CORRELATION_ID_LEN: usize = 128;

/// Correlation ID for request tracing.
///
/// Client-supplied ids are kept when they are short visible-ASCII tokens;
/// anything else is replaced by a fresh UUID v4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a new random correlation id
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a client-supplied id, if usable
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let usable = !value.is_empty()
            && value.len() <= MAX_CORRELATION_ID_LEN
            && value.bytes().all(|b| b.is_ascii_graphic());
        usable.then(|| Self(value.to_string()))
    }

    /// Read the id from the `X-Correlation-ID` header, generating one if absent or unusable
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_else(Self::generate)
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the correlation id middleware when it is installed
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(id.clone());
        }

        Ok(Self::from_headers(&parts.headers))
    }
}
