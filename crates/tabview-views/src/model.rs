//! Saved view and preset models

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabview_core::{SortDirection, Value};

/// The reusable sub-state a saved view captures: filters and sort.
///
/// Deliberately excludes the search query and the page position - a
/// saved view is a reusable query, not a navigational bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Active filter entries, in insertion order
    pub active_filters: IndexMap<String, Value>,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
}

/// A persisted, named snapshot of filters and sort
///
/// Immutable once created: re-saving creates a new entity, there is no
/// update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedView {
    pub id: Uuid,
    /// Non-empty, unique within its scope
    pub name: String,
    pub description: Option<String>,
    pub snapshot: ViewSnapshot,
    pub created_at: DateTime<Utc>,
}

/// A caller-supplied, read-only saved-view-shaped value with no
/// persistence lifecycle
///
/// Applying a preset overwrites query state exactly like applying a
/// saved view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: Option<String>,
    pub snapshot: ViewSnapshot,
}

impl Preset {
    pub fn new(name: impl Into<String>, snapshot: ViewSnapshot) -> Self {
        Self {
            name: name.into(),
            description: None,
            snapshot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut snapshot = ViewSnapshot::default();
        snapshot
            .active_filters
            .insert("status".to_string(), Value::String("active".to_string()));
        snapshot
            .active_filters
            .insert("budget_min".to_string(), Value::Int(100));
        snapshot.sort_field = Some("name".to_string());
        snapshot.sort_direction = SortDirection::Desc;

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: ViewSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
        // IndexMap keeps insertion order through the round trip
        let keys: Vec<&String> = restored.active_filters.keys().collect();
        assert_eq!(keys, vec!["status", "budget_min"]);
    }
}
