//! Concrete registration stores.

pub mod sqlite;

pub use sqlite::{SqliteRegistrationStore, StoreConfig};
