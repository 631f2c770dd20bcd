//! The derivation pipeline
//!
//! filter -> search -> stable sort -> paginate. Pure functions over the
//! record slice; the engine calls these after every state mutation.

use std::cmp::Ordering;

use tabview_core::{FilterDef, FilterKind, Record, SortDirection, TableConfig, Value};

use crate::query::QueryState;

/// The visible slice of the record set plus the counts the pagination
/// invariants are clamped against
#[derive(Debug, Clone, Default)]
pub struct DerivedView {
    /// Records on the current page, in display order
    pub page_items: Vec<Record>,
    /// Records matching the active filters and search, across all pages
    pub filtered_count: usize,
    /// `ceil(filtered_count / page_size)`; zero when nothing matches
    pub total_pages: usize,
    /// The effective page after clamping into `[1, max(total_pages, 1)]`
    pub page: usize,
}

/// Run the full pipeline for the given query state
pub fn derive(records: &[Record], config: &TableConfig, query: &QueryState) -> DerivedView {
    let mut matching: Vec<&Record> = records
        .iter()
        .filter(|r| matches_filters(r, config, query) && matches_search(r, config, query))
        .collect();

    if let Some(field) = &query.sort_field {
        // Vec::sort_by is stable, so ties keep insertion order
        matching.sort_by(|a, b| {
            let ordering = compare_fields(a.get(field), b.get(field));
            match query.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let filtered_count = matching.len();
    let total_pages = filtered_count.div_ceil(query.page_size);
    let page = query.page.clamp(1, total_pages.max(1));

    let page_items = matching
        .into_iter()
        .skip((page - 1) * query.page_size)
        .take(query.page_size)
        .cloned()
        .collect();

    DerivedView {
        page_items,
        filtered_count,
        total_pages,
        page,
    }
}

/// Ids of every record matching the active filters and search,
/// ignoring pagination. Backs "select all matching current filter".
pub fn matching_ids(records: &[Record], config: &TableConfig, query: &QueryState) -> Vec<String> {
    records
        .iter()
        .filter(|r| matches_filters(r, config, query) && matches_search(r, config, query))
        .map(|r| r.id.clone())
        .collect()
}

fn matches_filters(record: &Record, config: &TableConfig, query: &QueryState) -> bool {
    config
        .filters
        .iter()
        .all(|filter| matches_filter(record, filter, query))
}

fn matches_filter(record: &Record, filter: &FilterDef, query: &QueryState) -> bool {
    match &filter.kind {
        FilterKind::Select { .. } => {
            let Some(wanted) = query.active_filters.get(&filter.key) else {
                return true;
            };
            record
                .get(&filter.key)
                .map(|cell| select_matches(cell, wanted))
                .unwrap_or(false)
        }
        FilterKind::Range => {
            let min = bound_f64(query, &format!("{}_min", filter.key));
            let max = bound_f64(query, &format!("{}_max", filter.key));
            if min.is_none() && max.is_none() {
                return true;
            }
            // A bounded range filter excludes non-numeric and missing
            // values rather than silently including them (fail-closed).
            let Some(cell) = record.get(&filter.key).and_then(Value::as_f64) else {
                return false;
            };
            min.map(|m| cell >= m).unwrap_or(true) && max.map(|m| cell <= m).unwrap_or(true)
        }
        FilterKind::DateRange => {
            let from = bound_date(query, &format!("{}_from", filter.key));
            let to = bound_date(query, &format!("{}_to", filter.key));
            if from.is_none() && to.is_none() {
                return true;
            }
            let Some(cell) = record.get(&filter.key).and_then(Value::as_date) else {
                return false;
            };
            // Calendar-day comparison, inclusive of both bounds
            from.map(|d| cell >= d).unwrap_or(true) && to.map(|d| cell <= d).unwrap_or(true)
        }
    }
}

fn bound_f64(query: &QueryState, key: &str) -> Option<f64> {
    query.active_filters.get(key).and_then(Value::as_f64)
}

fn bound_date(query: &QueryState, key: &str) -> Option<chrono::NaiveDate> {
    query.active_filters.get(key).and_then(Value::as_date)
}

/// Exact match for select filters, case-insensitive for strings
fn select_matches(cell: &Value, wanted: &Value) -> bool {
    match (cell.as_str(), wanted.as_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => match (cell.as_f64(), wanted.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => cell == wanted,
        },
    }
}

fn matches_search(record: &Record, config: &TableConfig, query: &QueryState) -> bool {
    if query.search_query.is_empty() {
        return true;
    }
    let needle = query.search_query.to_lowercase();
    config.search_fields().iter().any(|field| {
        record
            .get(field)
            .map(|v| v.to_string().to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Compare two field values for sorting: numeric when both are numeric,
/// calendar day when both are dates, lowercase string otherwise.
/// Missing and null values sort after present ones.
pub(crate) fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            if let (Some(na), Some(nb)) = (a.as_f64(), b.as_f64()) {
                na.partial_cmp(&nb).unwrap_or(Ordering::Equal)
            } else if let (Some(da), Some(db)) = (a.as_date(), b.as_date()) {
                da.cmp(&db)
            } else {
                a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase())
            }
        }
    }
}
