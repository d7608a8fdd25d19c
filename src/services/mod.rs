//! External collaborators module
//!
//! The durable store that keeps the set counter across restarts.

pub mod store;

// Re-export main types
pub use store::{load_count, JsonFileStore, KeyValueStore, MemoryStore, COUNT_KEY};
