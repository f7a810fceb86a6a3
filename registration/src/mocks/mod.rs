//! Mock provider implementations for testing.
//!
//! In-memory implementations of every provider trait, with failure and delay
//! injection, for use in unit and integration tests.

pub mod mailer;
pub mod store;

pub use mailer::MockMailer;
pub use store::InMemoryRegistrationStore;
