//! Key-value persistence for per-subject state.

pub mod error;
pub mod memory;
pub mod schema;
pub mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use store::{KeyValueStore, SqliteStore, StoredValue};
