//! Bulk action contract types
//!
//! The action callback is dependency-injected per dispatch; the engine
//! owns the reconciliation of selection state afterwards.

use std::collections::HashMap;

/// What the external bulk action reports back
///
/// Uniform success, or - when the collaborator supports it - a per-id
/// result map for partial success reporting.
pub enum BulkResponse {
    /// Every id succeeded
    Done,
    /// Individual outcome per id. Ids absent from the map are treated
    /// as failed and stay selected.
    PerId(HashMap<String, std::result::Result<(), String>>),
}

/// Return type of a bulk action callback: a response on success, or a
/// retryable failure message that leaves the selection untouched
pub type BulkResult = std::result::Result<BulkResponse, String>;

/// Outcome of a dispatch after the engine reconciled selection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The selection was empty; nothing was dispatched
    Skipped,
    /// Uniform success: selection cleared, the caller should refresh
    /// the record set
    Completed { affected: usize },
    /// Per-id reporting: succeeded ids were removed from the selection
    /// individually, failed ids remain selected for retry
    Partial {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },
}

/// Split a per-id result map over the dispatched ids
pub(crate) fn partition_per_id(
    ids: &[String],
    results: &HashMap<String, std::result::Result<(), String>>,
) -> (Vec<String>, Vec<String>) {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for id in ids {
        match results.get(id) {
            Some(Ok(())) => succeeded.push(id.clone()),
            _ => failed.push(id.clone()),
        }
    }
    (succeeded, failed)
}
