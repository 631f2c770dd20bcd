//! The table engine
//!
//! Owns the validated registry, the record set, query and selection
//! state, the event sink, and an optional view store. Every public
//! mutation re-derives the visible view and clamps the page back into
//! bounds before returning, including on error paths, so the state
//! never violates its invariants between operations.

use std::collections::HashSet;

use uuid::Uuid;

use tabview_core::{
    FilterDef, FilterKind, Record, Result, SortDirection, TabViewError, TableConfig, Value,
};
use tabview_views::{Preset, SavedView, ViewSnapshot, ViewStore};

use crate::bulk::{BulkOutcome, BulkResponse, BulkResult, partition_per_id};
use crate::derive::{self, DerivedView};
use crate::events::{EventSink, TableEvent};
use crate::query::QueryState;
use crate::selection::SelectionState;
use crate::source::{FetchGuard, FetchPage, FetchTicket, RecordFetcher};

/// A table view engine instance
///
/// Single-threaded: each instance owns its state exclusively and every
/// operation is a synchronous mutation.
pub struct TableEngine {
    config: TableConfig,
    /// In memory mode the full record set; in remote mode the loaded
    /// window the server returned for the current query state
    records: Vec<Record>,
    query: QueryState,
    selection: SelectionState,
    events: EventSink,
    derived: DerivedView,
    fetcher: Option<Box<dyn RecordFetcher>>,
    remote_total: usize,
    fetch_guard: FetchGuard,
    view_store: Option<Box<dyn ViewStore>>,
    view_scope: String,
}

impl TableEngine {
    /// Build an engine over a full in-memory record collection
    ///
    /// Validates the registry; all later operations assume a valid
    /// config.
    pub fn new(config: TableConfig, records: Vec<Record>) -> Result<Self> {
        config.validate()?;
        let query = QueryState::from_config(&config);
        let mut engine = Self {
            config,
            records,
            query,
            selection: SelectionState::new(),
            events: EventSink::new(),
            derived: DerivedView::default(),
            fetcher: None,
            remote_total: 0,
            fetch_guard: FetchGuard::new(),
            view_store: None,
            view_scope: String::new(),
        };
        engine.rederive();
        Ok(engine)
    }

    /// Build an engine over a server-side paged source
    ///
    /// The server applies the query state; the engine installs returned
    /// pages via `refresh` / `complete_fetch`.
    pub fn with_fetcher(config: TableConfig, fetcher: Box<dyn RecordFetcher>) -> Result<Self> {
        let mut engine = Self::new(config, Vec::new())?;
        engine.fetcher = Some(fetcher);
        engine.rederive();
        Ok(engine)
    }

    /// Attach a view persistence backend, scoping this table's views
    pub fn with_view_store(
        mut self,
        store: Box<dyn ViewStore>,
        scope: impl Into<String>,
    ) -> Self {
        self.view_store = Some(store);
        self.view_scope = scope.into();
        self
    }

    /// Register a callback for engine events
    pub fn subscribe(&mut self, subscriber: impl FnMut(&TableEvent) + 'static) {
        self.events.subscribe(subscriber);
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// The current derived view: page items, filtered count, page bounds
    pub fn derived(&self) -> &DerivedView {
        &self.derived
    }

    /// Recompute the derived view and clamp the page into bounds
    fn rederive(&mut self) {
        self.derived = if self.fetcher.is_none() {
            derive::derive(&self.records, &self.config, &self.query)
        } else {
            // Remote mode: the loaded window already reflects the
            // query state; only the pagination math runs locally.
            let filtered_count = self.remote_total;
            let total_pages = filtered_count.div_ceil(self.query.page_size);
            DerivedView {
                page_items: self.records.clone(),
                filtered_count,
                total_pages,
                page: self.query.page.clamp(1, total_pages.max(1)),
            }
        };
        self.query.page = self.derived.page;
    }

    fn emit_selection_changed(&mut self) {
        let count = self.selection.count();
        self.events.emit(&TableEvent::SelectionChanged { count });
    }

    // --- Query state operations -------------------------------------

    /// Sort by `field`, toggling direction when it is already the sort
    /// field
    ///
    /// Callers must not surface a sort affordance for non-sortable
    /// columns, but an invocation on one is not a crash: the change is
    /// silently ignored, prior sort state kept, and the view still
    /// re-derived.
    pub fn set_sort(&mut self, field: &str) {
        if !self.config.is_sortable(field) {
            tracing::warn!("Ignoring sort on non-sortable column '{}'", field);
            self.rederive();
            return;
        }
        if self.query.sort_field.as_deref() == Some(field) {
            self.query.sort_direction = self.query.sort_direction.toggle();
        } else {
            self.query.sort_field = Some(field.to_string());
            self.query.sort_direction = SortDirection::Asc;
        }
        self.rederive();
        let direction = self.query.sort_direction;
        self.events.emit(&TableEvent::SortChanged {
            field: field.to_string(),
            direction,
        });
    }

    /// Set or clear one filter entry
    ///
    /// Empty-string and null values clear the entry. Changing the
    /// result set invalidates the old page position, so the page resets
    /// to 1. The search query is untouched - filters and search
    /// compose.
    pub fn set_filter(&mut self, key: &str, value: Value) -> Result<()> {
        let Some(filter) = self.config.filter_for_state_key(key).cloned() else {
            self.rederive();
            return Err(TabViewError::Validation(format!(
                "unknown filter key '{}'",
                key
            )));
        };
        if !QueryState::is_inert(&value) {
            if let Err(e) = validate_filter_value(&filter, key, &value) {
                self.rederive();
                return Err(e);
            }
        }
        self.query.set_filter_value(key, value);
        self.query.page = 1;
        self.rederive();
        self.events.emit(&TableEvent::FilterChanged {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Set the free-text search query and reset to the first page
    ///
    /// Debouncing is the caller's concern; the engine applies the query
    /// as given.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.query.search_query = text.into();
        self.query.page = 1;
        self.rederive();
        self.events.emit(&TableEvent::SearchChanged);
    }

    /// Navigate to a page, clamped into `[1, total_pages]`. No other
    /// state resets.
    pub fn set_page(&mut self, page: usize) {
        let clamped = page.clamp(1, self.derived.total_pages.max(1));
        if clamped != self.query.page {
            self.query.page = clamped;
            self.rederive();
            let page = self.query.page;
            self.events.emit(&TableEvent::PageChanged { page });
        }
    }

    /// Change the page size, re-clamping the page into the new bounds
    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        if page_size == 0 {
            self.rederive();
            return Err(TabViewError::Validation(
                "page size must be greater than zero".to_string(),
            ));
        }
        let old_page = self.query.page;
        self.query.page_size = page_size;
        self.rederive();
        if self.query.page != old_page {
            let page = self.query.page;
            self.events.emit(&TableEvent::PageChanged { page });
        }
        Ok(())
    }

    /// Reset filters, search, and page back to defaults
    ///
    /// Sort survives: it is a display preference, not a filter.
    pub fn clear_all_filters(&mut self) {
        self.query.clear_filters();
        self.rederive();
        self.events.emit(&TableEvent::FiltersCleared);
    }

    // --- Selection operations ---------------------------------------

    /// Select or deselect one record
    ///
    /// With a server-side source the loaded window is one page, not the
    /// record set, so id membership is only checked in memory mode.
    pub fn toggle(&mut self, id: &str, checked: bool) {
        if checked && self.fetcher.is_none() && !self.records.iter().any(|r| r.id == id) {
            tracing::warn!("Ignoring selection of unknown record id '{}'", id);
            return;
        }
        if self.selection.toggle(id, checked) {
            self.emit_selection_changed();
        }
    }

    /// Select or deselect every record on the current page only
    pub fn select_page(&mut self, checked: bool) {
        let ids: Vec<String> = self
            .derived
            .page_items
            .iter()
            .map(|r| r.id.clone())
            .collect();
        if self.selection.toggle_all(&ids, checked) {
            self.emit_selection_changed();
        }
    }

    /// Select or deselect every record matching the current filter and
    /// search, across all pages - not just the visible page
    ///
    /// With a server-side source only the loaded window is known, so
    /// the operation is limited to it.
    pub fn select_all_matching(&mut self, checked: bool) {
        let ids = if self.fetcher.is_none() {
            derive::matching_ids(&self.records, &self.config, &self.query)
        } else {
            self.records.iter().map(|r| r.id.clone()).collect()
        };
        if self.selection.toggle_all(&ids, checked) {
            self.emit_selection_changed();
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_selection_changed();
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    pub fn selection_count(&self) -> usize {
        self.selection.count()
    }

    /// Selected ids in a stable order
    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids()
    }

    // --- Record set --------------------------------------------------

    /// Swap in a new record set, pruning selection as a post-condition
    ///
    /// This is the refresh entry point after a successful bulk action
    /// or an external data change.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        let pruned = {
            let existing: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
            self.selection.retain_existing(&existing)
        };
        self.rederive();
        if pruned {
            self.emit_selection_changed();
        }
    }

    /// Fetch the current page from the remote source and install it
    ///
    /// No-op in memory mode. On fetch failure state is left unchanged
    /// and the error surfaces as retryable.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(fetcher) = &self.fetcher else {
            self.rederive();
            return Ok(());
        };
        let ticket = self.fetch_guard.begin();
        match fetcher.fetch(&self.query) {
            Ok(page) => {
                self.complete_fetch(ticket, page);
                Ok(())
            }
            Err(e) => {
                self.rederive();
                Err(e)
            }
        }
    }

    /// Start an asynchronous fetch: returns the ticket to settle with
    /// and a snapshot of the query state to fetch against
    pub fn begin_fetch(&mut self) -> (FetchTicket, QueryState) {
        (self.fetch_guard.begin(), self.query.clone())
    }

    /// Settle a fetch. A response for a superseded ticket is ignored
    /// (last-write-wins); returns whether the page was installed.
    ///
    /// The installed page is one window of the record source, so the
    /// selection is never pruned here - rows selected on other pages
    /// stay selected across navigation. Pruning happens on a genuine
    /// source swap (`replace_records`) and through bulk reconciliation.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, page: FetchPage) -> bool {
        if !self.fetch_guard.is_current(ticket) {
            tracing::debug!("Ignoring stale fetch response");
            return false;
        }
        self.records = page.records;
        self.remote_total = page.total_count;
        self.rederive();
        true
    }

    // --- Bulk dispatch -----------------------------------------------

    /// Apply an external action to the current selection and reconcile
    /// selection state afterward
    ///
    /// An empty selection is a no-op, not an error. The action is
    /// invoked exactly once with the full id set. On uniform success
    /// the selection clears and the caller should refresh the record
    /// set; on failure the selection is left untouched for retry; with
    /// per-id results, succeeded ids are deselected individually and
    /// failed ids remain selected.
    pub fn dispatch_bulk<F>(&mut self, action_id: &str, action: F) -> Result<BulkOutcome>
    where
        F: FnOnce(&[String]) -> BulkResult,
    {
        if self.config.bulk_action(action_id).is_none() {
            self.rederive();
            return Err(TabViewError::Validation(format!(
                "unknown bulk action '{}'",
                action_id
            )));
        }
        let ids = self.selection.ids();
        if ids.is_empty() {
            tracing::debug!("Skipping bulk '{}' dispatch: empty selection", action_id);
            return Ok(BulkOutcome::Skipped);
        }

        match action(&ids) {
            Err(message) => {
                tracing::warn!("Bulk '{}' failed: {}", action_id, message);
                self.rederive();
                Err(TabViewError::ExternalAction(message))
            }
            Ok(BulkResponse::Done) => {
                self.selection.clear();
                self.rederive();
                self.emit_selection_changed();
                self.events.emit(&TableEvent::BulkActionCompleted {
                    action: action_id.to_string(),
                    affected: ids.len(),
                });
                Ok(BulkOutcome::Completed {
                    affected: ids.len(),
                })
            }
            Ok(BulkResponse::PerId(results)) => {
                let (succeeded, failed) = partition_per_id(&ids, &results);
                let changed = self.selection.toggle_all(&succeeded, false);
                self.rederive();
                if changed {
                    self.emit_selection_changed();
                }
                self.events.emit(&TableEvent::BulkActionCompleted {
                    action: action_id.to_string(),
                    affected: succeeded.len(),
                });
                Ok(BulkOutcome::Partial { succeeded, failed })
            }
        }
    }

    // --- Saved views -------------------------------------------------

    /// Persist the current filters and sort as a named view
    pub fn save_view(&mut self, name: &str, description: Option<&str>) -> Result<SavedView> {
        let Some(store) = &self.view_store else {
            return Err(TabViewError::Storage(
                "no view store configured".to_string(),
            ));
        };
        let view = store.create(&self.view_scope, name, description, self.query.snapshot())?;
        self.events.emit(&TableEvent::ViewSaved {
            id: view.id,
            name: view.name.clone(),
        });
        Ok(view)
    }

    /// List the saved views for this table's scope
    pub fn list_views(&self) -> Result<Vec<SavedView>> {
        match &self.view_store {
            Some(store) => store.list(&self.view_scope),
            None => Ok(Vec::new()),
        }
    }

    /// Apply a saved view: overwrite filters and sort, reset the page,
    /// keep the search query
    pub fn apply_view(&mut self, view: &SavedView) {
        self.apply_snapshot(&view.snapshot, &view.name);
    }

    /// Apply a saved view by id
    ///
    /// A view deleted from another session is recoverable: returns
    /// `Ok(false)` with state unchanged instead of propagating an
    /// error, so the caller can silently refresh its view list.
    pub fn apply_view_by_id(&mut self, id: &Uuid) -> Result<bool> {
        let Some(store) = &self.view_store else {
            return Ok(false);
        };
        match store.get(id)? {
            Some(view) => {
                self.apply_view(&view);
                Ok(true)
            }
            None => {
                tracing::debug!("Saved view {} no longer exists", id);
                self.rederive();
                Ok(false)
            }
        }
    }

    /// Apply a caller-supplied preset, identical semantics to a saved
    /// view
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.apply_snapshot(&preset.snapshot, &preset.name);
    }

    fn apply_snapshot(&mut self, snapshot: &ViewSnapshot, name: &str) {
        self.query.apply_snapshot(snapshot);
        self.rederive();
        self.events.emit(&TableEvent::ViewApplied {
            name: name.to_string(),
        });
    }

    /// Delete a saved view; idempotent, a nonexistent id is a no-op
    pub fn delete_view(&mut self, id: &Uuid) -> Result<()> {
        let Some(store) = &self.view_store else {
            return Ok(());
        };
        match store.delete(id) {
            Ok(_) => Ok(()),
            Err(TabViewError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Check a non-inert filter value against the filter's kind
fn validate_filter_value(filter: &FilterDef, state_key: &str, value: &Value) -> Result<()> {
    match &filter.kind {
        FilterKind::Select { options } => {
            let valid = value
                .as_str()
                .map(|v| options.iter().any(|o| o.value.eq_ignore_ascii_case(v)))
                .unwrap_or(false);
            if !valid {
                return Err(TabViewError::Validation(format!(
                    "'{}' is not a valid option for filter '{}'",
                    value, filter.key
                )));
            }
        }
        FilterKind::Range => {
            if value.as_f64().is_none() {
                return Err(TabViewError::Validation(format!(
                    "range bound '{}' requires a numeric value",
                    state_key
                )));
            }
        }
        FilterKind::DateRange => {
            if value.as_date().is_none() {
                return Err(TabViewError::Validation(format!(
                    "date bound '{}' requires a date value",
                    state_key
                )));
            }
        }
    }
    Ok(())
}
