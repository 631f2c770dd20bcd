//! Tabview Views - Saved view persistence
//!
//! Named snapshots of a table's filter and sort state ("saved views"),
//! the store trait the engine talks to, an in-memory store for tests
//! and ephemeral callers, and the SQLite-backed store.

mod model;
mod storage;
mod store;

pub use model::*;
pub use storage::*;
pub use store::*;
