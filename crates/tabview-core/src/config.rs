//! Column, filter, and action registry
//!
//! Static configuration supplied by the caller when a table is set up.
//! All validation happens here at registration time; the engine assumes
//! a validated config at use time.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabViewError};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Rendering type of a column
///
/// The engine itself only cares about the underlying value for sorting
/// and filtering; the type tells the rendering layer which cell widget
/// to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Badge,
    Progress,
    Date,
    Currency,
    Avatar,
}

/// A column definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Field key, unique within the column set
    pub key: String,
    /// Display label
    pub label: String,
    /// Cell rendering type
    pub column_type: ColumnType,
    /// Whether the column can be sorted on (default true)
    pub sortable: bool,
}

impl ColumnDef {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type,
            sortable: true,
        }
    }

    /// Mark the column as not sortable
    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// An option of a select filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Kind of a filter, with the per-kind configuration attached
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FilterKind {
    /// Exact match against one of an ordered list of options
    Select { options: Vec<FilterOption> },
    /// Inclusive numeric bounds, read from `{key}_min` / `{key}_max`
    Range,
    /// Inclusive calendar-day bounds, read from `{key}_from` / `{key}_to`
    DateRange,
}

/// A filter definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDef {
    /// Field key the filter applies to
    pub key: String,
    /// Display label
    pub label: String,
    pub kind: FilterKind,
}

impl FilterDef {
    pub fn select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<FilterOption>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Select { options },
        }
    }

    pub fn range(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::Range,
        }
    }

    pub fn date_range(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: FilterKind::DateRange,
        }
    }

    /// The query-state keys this filter reads
    ///
    /// A range filter decomposes into two bound entries; a select filter
    /// reads its own key directly.
    pub fn state_keys(&self) -> Vec<String> {
        match self.kind {
            FilterKind::Select { .. } => vec![self.key.clone()],
            FilterKind::Range => {
                vec![format!("{}_min", self.key), format!("{}_max", self.key)]
            }
            FilterKind::DateRange => {
                vec![format!("{}_from", self.key), format!("{}_to", self.key)]
            }
        }
    }

    /// Whether `state_key` is one of this filter's query-state keys
    pub fn reads(&self, state_key: &str) -> bool {
        self.state_keys().iter().any(|k| k == state_key)
    }
}

/// A per-row action descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowAction {
    pub id: String,
    pub label: String,
    /// Destructive actions get a confirmation step in the UI
    pub destructive: bool,
}

impl RowAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            destructive: false,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// A bulk action descriptor, applied to the whole selection in one dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkActionDef {
    pub id: String,
    pub label: String,
    pub destructive: bool,
}

impl BulkActionDef {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            destructive: false,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// Full table configuration: columns, filters, actions, search fields,
/// and query-state defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub columns: Vec<ColumnDef>,
    pub filters: Vec<FilterDef>,
    pub row_actions: Vec<RowAction>,
    pub bulk_actions: Vec<BulkActionDef>,
    /// Fields the free-text search matches against. Empty means every
    /// column key is searchable.
    pub searchable_fields: Vec<String>,
    /// Initial sort, must name a sortable column
    pub default_sort: Option<(String, SortDirection)>,
    pub default_page_size: usize,
}

impl TableConfig {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            filters: Vec::new(),
            row_actions: Vec::new(),
            bulk_actions: Vec::new(),
            searchable_fields: Vec::new(),
            default_sort: None,
            default_page_size: 25,
        }
    }

    pub fn with_filters(mut self, filters: Vec<FilterDef>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_row_actions(mut self, actions: Vec<RowAction>) -> Self {
        self.row_actions = actions;
        self
    }

    pub fn with_bulk_actions(mut self, actions: Vec<BulkActionDef>) -> Self {
        self.bulk_actions = actions;
        self
    }

    pub fn with_searchable_fields(mut self, fields: Vec<String>) -> Self {
        self.searchable_fields = fields;
        self
    }

    pub fn with_default_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some((field.into(), direction));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// Look up a column by key
    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Whether `field` names a sortable column
    pub fn is_sortable(&self, field: &str) -> bool {
        self.column(field).map(|c| c.sortable).unwrap_or(false)
    }

    /// Find the filter definition that reads the given query-state key
    pub fn filter_for_state_key(&self, state_key: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|f| f.reads(state_key))
    }

    /// Look up a bulk action by id
    pub fn bulk_action(&self, id: &str) -> Option<&BulkActionDef> {
        self.bulk_actions.iter().find(|a| a.id == id)
    }

    /// The effective search fields: the configured set, or every column
    /// key when none were configured
    pub fn search_fields(&self) -> Vec<&str> {
        if self.searchable_fields.is_empty() {
            self.columns.iter().map(|c| c.key.as_str()).collect()
        } else {
            self.searchable_fields.iter().map(|s| s.as_str()).collect()
        }
    }

    /// Validate the registry
    ///
    /// Runs once at engine construction. Catches duplicate keys, filter
    /// key collisions with another filter's derived suffix keys, empty
    /// select option lists, duplicate action ids, and defaults that do
    /// not resolve.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(TabViewError::Validation(
                "table config requires at least one column".to_string(),
            ));
        }

        let mut seen_columns = std::collections::HashSet::new();
        for col in &self.columns {
            if col.key.is_empty() {
                return Err(TabViewError::Validation(
                    "column key must not be empty".to_string(),
                ));
            }
            if !seen_columns.insert(col.key.as_str()) {
                return Err(TabViewError::Validation(format!(
                    "duplicate column key '{}'",
                    col.key
                )));
            }
        }

        let mut state_keys = std::collections::HashSet::new();
        for filter in &self.filters {
            if filter.key.is_empty() {
                return Err(TabViewError::Validation(
                    "filter key must not be empty".to_string(),
                ));
            }
            if let FilterKind::Select { options } = &filter.kind {
                if options.is_empty() {
                    return Err(TabViewError::Validation(format!(
                        "select filter '{}' has no options",
                        filter.key
                    )));
                }
            }
            // A filter's own key and its derived suffix keys must not
            // collide with any other filter's state keys.
            for key in filter.state_keys() {
                if !state_keys.insert(key.clone()) {
                    return Err(TabViewError::Validation(format!(
                        "filter state key '{}' collides with another filter",
                        key
                    )));
                }
            }
        }

        let mut action_ids = std::collections::HashSet::new();
        for action in &self.row_actions {
            if !action_ids.insert(action.id.as_str()) {
                return Err(TabViewError::Validation(format!(
                    "duplicate row action id '{}'",
                    action.id
                )));
            }
        }
        let mut bulk_ids = std::collections::HashSet::new();
        for action in &self.bulk_actions {
            if !bulk_ids.insert(action.id.as_str()) {
                return Err(TabViewError::Validation(format!(
                    "duplicate bulk action id '{}'",
                    action.id
                )));
            }
        }

        if let Some((field, _)) = &self.default_sort {
            if !self.is_sortable(field) {
                return Err(TabViewError::Validation(format!(
                    "default sort field '{}' is not a sortable column",
                    field
                )));
            }
        }

        if self.default_page_size == 0 {
            return Err(TabViewError::Validation(
                "default page size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("name", "Name", ColumnType::Text),
            ColumnDef::new("status", "Status", ColumnType::Badge),
            ColumnDef::new("budget", "Budget", ColumnType::Currency),
            ColumnDef::new("avatar", "Owner", ColumnType::Avatar).not_sortable(),
        ]
    }

    #[test]
    fn test_valid_config() {
        let config = TableConfig::new(base_columns())
            .with_filters(vec![
                FilterDef::select(
                    "status",
                    "Status",
                    vec![
                        FilterOption::new("active", "Active"),
                        FilterOption::new("archived", "Archived"),
                    ],
                ),
                FilterDef::range("budget", "Budget"),
            ])
            .with_default_sort("name", SortDirection::Asc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_column_key_rejected() {
        let mut columns = base_columns();
        columns.push(ColumnDef::new("name", "Name again", ColumnType::Text));
        let err = TableConfig::new(columns).validate().unwrap_err();
        assert!(err.to_string().contains("duplicate column key"));
    }

    #[test]
    fn test_filter_suffix_collision_rejected() {
        // "budget" range derives "budget_min"/"budget_max"; a second
        // filter literally named "budget_min" collides.
        let config = TableConfig::new(base_columns()).with_filters(vec![
            FilterDef::range("budget", "Budget"),
            FilterDef::select(
                "budget_min",
                "Minimum",
                vec![FilterOption::new("0", "Zero")],
            ),
        ]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn test_empty_select_options_rejected() {
        let config = TableConfig::new(base_columns())
            .with_filters(vec![FilterDef::select("status", "Status", vec![])]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsortable_default_sort_rejected() {
        let config =
            TableConfig::new(base_columns()).with_default_sort("avatar", SortDirection::Asc);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = TableConfig::new(base_columns()).with_page_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_state_keys_for_kinds() {
        let range = FilterDef::range("budget", "Budget");
        assert_eq!(range.state_keys(), vec!["budget_min", "budget_max"]);
        assert!(range.reads("budget_max"));
        assert!(!range.reads("budget"));

        let dates = FilterDef::date_range("due", "Due");
        assert_eq!(dates.state_keys(), vec!["due_from", "due_to"]);

        let select = FilterDef::select("status", "Status", vec![FilterOption::new("a", "A")]);
        assert_eq!(select.state_keys(), vec!["status"]);
    }

    #[test]
    fn test_search_fields_fall_back_to_all_columns() {
        let config = TableConfig::new(base_columns());
        assert_eq!(
            config.search_fields(),
            vec!["name", "status", "budget", "avatar"]
        );
        let config = config.with_searchable_fields(vec!["name".to_string()]);
        assert_eq!(config.search_fields(), vec!["name"]);
    }
}
