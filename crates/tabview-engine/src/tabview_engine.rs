//! Tabview Engine - The generic tabular data view engine
//!
//! Takes an arbitrary record set plus a column/filter/action
//! configuration and produces sorted, filtered, paginated,
//! multi-select-capable output, with savable views and bulk operations.
//!
//! The engine is single-threaded and synchronous: every public
//! operation is an in-memory mutation followed by a re-derivation that
//! restores the pagination invariants before control returns. The only
//! async-shaped boundary is the record fetcher, guarded against stale
//! responses by a request sequence number.

mod bulk;
mod derive;
mod engine;
mod events;
mod query;
mod selection;
mod source;

pub use bulk::*;
pub use derive::*;
pub use engine::*;
pub use events::*;
pub use query::*;
pub use selection::*;
pub use source::*;
