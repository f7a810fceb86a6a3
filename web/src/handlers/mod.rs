//! HTTP request handlers shared by every service router.

pub mod health;

// Re-export common handler utilities
pub use health::{health_check, readiness_response};
