//! Query state: sort, filters, search, pagination
//!
//! Mutated exclusively through the engine's public operations, which
//! re-derive and clamp after every change so the state is never
//! partially invalid.

use indexmap::IndexMap;

use tabview_core::{SortDirection, TableConfig, Value};
use tabview_views::ViewSnapshot;

/// The combined sort/filter/search/pagination configuration driving
/// what subset of records is visible
#[derive(Debug, Clone)]
pub struct QueryState {
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    /// Active filter entries keyed by query-state key (a select
    /// filter's own key, or a range filter's `_min`/`_max` /
    /// `_from`/`_to` suffix keys)
    pub active_filters: IndexMap<String, Value>,
    pub search_query: String,
    /// 1-indexed
    pub page: usize,
    pub page_size: usize,
}

impl QueryState {
    /// Initial state from the registry defaults
    pub fn from_config(config: &TableConfig) -> Self {
        let (sort_field, sort_direction) = match &config.default_sort {
            Some((field, direction)) => (Some(field.clone()), *direction),
            None => (None, SortDirection::Asc),
        };
        Self {
            sort_field,
            sort_direction,
            active_filters: IndexMap::new(),
            search_query: String::new(),
            page: 1,
            page_size: config.default_page_size,
        }
    }

    /// Whether a filter value is inert (clears the entry instead of
    /// setting it)
    pub fn is_inert(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Set or clear one filter entry. Inert values remove the key.
    /// Returns whether the entry changed.
    pub fn set_filter_value(&mut self, key: &str, value: Value) -> bool {
        if Self::is_inert(&value) {
            self.active_filters.shift_remove(key).is_some()
        } else {
            self.active_filters.insert(key.to_string(), value.clone()) != Some(value)
        }
    }

    /// Capture the reusable sub-state: filters and sort, never the
    /// search query or page position
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            active_filters: self.active_filters.clone(),
            sort_field: self.sort_field.clone(),
            sort_direction: self.sort_direction,
        }
    }

    /// Overwrite filters and sort from a snapshot. Resets the page,
    /// leaves the search query untouched so view application composes
    /// with free-text search.
    pub fn apply_snapshot(&mut self, snapshot: &ViewSnapshot) {
        self.active_filters = snapshot.active_filters.clone();
        self.sort_field = snapshot.sort_field.clone();
        self.sort_direction = snapshot.sort_direction;
        self.page = 1;
    }

    /// Back to the default filter state: filters and search cleared,
    /// page reset. Sort survives - it is a display preference, not a
    /// filter.
    pub fn clear_filters(&mut self) {
        self.active_filters.clear();
        self.search_query.clear();
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabview_core::{ColumnDef, ColumnType};

    fn config() -> TableConfig {
        TableConfig::new(vec![ColumnDef::new("name", "Name", ColumnType::Text)])
            .with_default_sort("name", SortDirection::Desc)
    }

    #[test]
    fn test_defaults_from_config() {
        let query = QueryState::from_config(&config());
        assert_eq!(query.sort_field, Some("name".to_string()));
        assert_eq!(query.sort_direction, SortDirection::Desc);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 25);
        assert!(query.active_filters.is_empty());
    }

    #[test]
    fn test_inert_value_clears_entry() {
        let mut query = QueryState::from_config(&config());
        assert!(query.set_filter_value("status", Value::String("active".into())));
        assert!(query.active_filters.contains_key("status"));

        assert!(query.set_filter_value("status", Value::String(String::new())));
        assert!(!query.active_filters.contains_key("status"));

        // Clearing an absent entry changes nothing
        assert!(!query.set_filter_value("status", Value::Null));
    }

    #[test]
    fn test_snapshot_excludes_search_and_page() {
        let mut query = QueryState::from_config(&config());
        query.set_filter_value("status", Value::String("active".into()));
        query.search_query = "urgent".to_string();
        query.page = 3;

        let snapshot = query.snapshot();
        assert_eq!(snapshot.active_filters.len(), 1);
        assert_eq!(snapshot.sort_field, Some("name".to_string()));

        let mut other = QueryState::from_config(&config());
        other.search_query = "kept".to_string();
        other.page = 7;
        other.apply_snapshot(&snapshot);
        assert_eq!(other.active_filters.len(), 1);
        assert_eq!(other.search_query, "kept");
        assert_eq!(other.page, 1);
    }

    #[test]
    fn test_clear_filters_keeps_sort() {
        let mut query = QueryState::from_config(&config());
        query.set_filter_value("status", Value::String("active".into()));
        query.search_query = "x".to_string();
        query.page = 4;

        query.clear_filters();
        assert!(query.active_filters.is_empty());
        assert!(query.search_query.is_empty());
        assert_eq!(query.page, 1);
        assert_eq!(query.sort_field, Some("name".to_string()));
        assert_eq!(query.sort_direction, SortDirection::Desc);
    }
}
