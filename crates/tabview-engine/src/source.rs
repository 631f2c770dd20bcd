//! Record sources
//!
//! The engine supports two record sources behind one public operation
//! contract: a full in-memory collection (the engine runs the whole
//! derivation pipeline), or a fetch function for server-side pagination
//! (the server applies the query state, the engine just installs the
//! returned page).
//!
//! A new fetch supersedes any in-flight one, last-write-wins: responses
//! carry the ticket of the request that produced them, and a stale
//! ticket is ignored at settle time. The engine never cancels in-flight
//! requests, and timeout/retry policy belongs to the caller's fetch
//! layer.

use tabview_core::{Record, Result};

use crate::query::QueryState;

/// One page of records from a server-side source, plus the total match
/// count across all pages
#[derive(Debug, Clone)]
pub struct FetchPage {
    pub records: Vec<Record>,
    pub total_count: usize,
}

/// A caller-supplied paged-list endpoint
pub trait RecordFetcher {
    fn fetch(&self, query: &QueryState) -> Result<FetchPage>;
}

impl<F> RecordFetcher for F
where
    F: Fn(&QueryState) -> Result<FetchPage>,
{
    fn fetch(&self, query: &QueryState) -> Result<FetchPage> {
        self(query)
    }
}

/// Token identifying one fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Monotonically increasing request sequence guard
///
/// `begin` invalidates every earlier ticket; `is_current` is checked at
/// settle time.
#[derive(Debug, Default)]
pub struct FetchGuard {
    current: u64,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any in-flight one
    pub fn begin(&mut self) -> FetchTicket {
        self.current += 1;
        FetchTicket(self.current)
    }

    /// Whether a response for this ticket is still the latest
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.current
    }
}
