//! Axum integration for the inscriptions service.
//!
//! The HTTP layer is the imperative shell around the intake reducer:
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON body, correlation id)
//! 3. **Build Action** from the extracted data
//! 4. **Dispatch** the action through a `Store` and wait for the terminal action
//! 5. **Map result** to an HTTP response ([`AppError`] for failures)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use inscriptions_web::{correlation_id_layer, handlers::health_check};
//!
//! let app = Router::new()
//!     .route("/health", get(health_check))
//!     .layer(correlation_id_layer());
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::CorrelationId;
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
