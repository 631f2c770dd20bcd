//! Tabview Core - Shared types for the table view engine
//!
//! This crate provides the fundamental types that the other tabview
//! crates depend on. It defines:
//!
//! - `Value` / `Record` - The dynamically-typed record model
//! - `ColumnDef` / `FilterDef` / `TableConfig` - The column, filter,
//!   and action registry, validated at registration time
//! - `TabViewError` - The common error type

mod config;
mod error;
mod types;

pub use config::*;
pub use error::*;
pub use types::*;
