//! View store trait and the in-memory implementation

use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use tabview_core::{Result, TabViewError};

use crate::model::{SavedView, ViewSnapshot};

/// Persistence backend for saved views
///
/// The engine only depends on this trait; callers pick the in-memory
/// store or the SQLite-backed one (or bring their own remote-backed
/// implementation). Views are scoped so one store can serve many
/// tables or users.
pub trait ViewStore {
    /// List all views in a scope, ordered by name
    fn list(&self, scope: &str) -> Result<Vec<SavedView>>;

    /// Look up a single view by id
    fn get(&self, id: &Uuid) -> Result<Option<SavedView>>;

    /// Create a view capturing `snapshot`
    ///
    /// Fails with a validation error when `name` is empty or already
    /// taken within the scope.
    fn create(
        &self,
        scope: &str,
        name: &str,
        description: Option<&str>,
        snapshot: ViewSnapshot,
    ) -> Result<SavedView>;

    /// Delete a view by id, returning whether a view existed
    ///
    /// Deleting a nonexistent id is not an error - concurrent deletion
    /// from another session is expected.
    fn delete(&self, id: &Uuid) -> Result<bool>;
}

fn lock_err<T>(e: std::sync::PoisonError<T>) -> TabViewError {
    TabViewError::Storage(format!("lock poisoned: {}", e))
}

/// Validate a view name against the existing names in its scope
pub(crate) fn validate_view_name(name: &str, existing: &[String]) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TabViewError::Validation(
            "view name must not be empty".to_string(),
        ));
    }
    if existing.iter().any(|n| n == name) {
        return Err(TabViewError::Validation(format!(
            "a view named '{}' already exists",
            name
        )));
    }
    Ok(())
}

/// In-memory view store
///
/// Used in tests and by callers that do not persist views across
/// sessions.
#[derive(Default)]
pub struct MemoryViewStore {
    views: Mutex<Vec<(String, SavedView)>>,
}

impl MemoryViewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewStore for MemoryViewStore {
    fn list(&self, scope: &str) -> Result<Vec<SavedView>> {
        let views = self.views.lock().map_err(lock_err)?;
        let mut result: Vec<SavedView> = views
            .iter()
            .filter(|(s, _)| s == scope)
            .map(|(_, v)| v.clone())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn get(&self, id: &Uuid) -> Result<Option<SavedView>> {
        let views = self.views.lock().map_err(lock_err)?;
        Ok(views.iter().find(|(_, v)| v.id == *id).map(|(_, v)| v.clone()))
    }

    fn create(
        &self,
        scope: &str,
        name: &str,
        description: Option<&str>,
        snapshot: ViewSnapshot,
    ) -> Result<SavedView> {
        let mut views = self.views.lock().map_err(lock_err)?;
        let existing: Vec<String> = views
            .iter()
            .filter(|(s, _)| s == scope)
            .map(|(_, v)| v.name.clone())
            .collect();
        validate_view_name(name, &existing)?;

        let view = SavedView {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            snapshot,
            created_at: Utc::now(),
        };
        views.push((scope.to_string(), view.clone()));
        tracing::debug!("Saved view '{}' in scope '{}'", name, scope);
        Ok(view)
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut views = self.views.lock().map_err(lock_err)?;
        let before = views.len();
        views.retain(|(_, v)| v.id != *id);
        Ok(views.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list_scoped() {
        let store = MemoryViewStore::new();
        store
            .create("projects", "Overdue", None, ViewSnapshot::default())
            .unwrap();
        store
            .create("projects", "Active", None, ViewSnapshot::default())
            .unwrap();
        store
            .create("invoices", "Unpaid", None, ViewSnapshot::default())
            .unwrap();

        let views = store.list("projects").unwrap();
        assert_eq!(views.len(), 2);
        // Ordered by name
        assert_eq!(views[0].name, "Active");
        assert_eq!(views[1].name, "Overdue");
        assert_eq!(store.list("invoices").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected_within_scope_only() {
        let store = MemoryViewStore::new();
        store
            .create("projects", "Mine", None, ViewSnapshot::default())
            .unwrap();
        let err = store
            .create("projects", "Mine", None, ViewSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, TabViewError::Validation(_)));
        // Same name in another scope is fine
        store
            .create("invoices", "Mine", None, ViewSnapshot::default())
            .unwrap();
    }

    #[test]
    fn test_empty_name_rejected() {
        let store = MemoryViewStore::new();
        let err = store
            .create("projects", "  ", None, ViewSnapshot::default())
            .unwrap_err();
        assert!(matches!(err, TabViewError::Validation(_)));
    }

    #[test]
    fn test_poisoned_lock_is_storage_error() {
        let store = std::sync::Arc::new(MemoryViewStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.views.lock().unwrap();
            panic!("poison the store lock");
        })
        .join();

        let err = store.list("projects").unwrap_err();
        assert!(matches!(err, TabViewError::Storage(_)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryViewStore::new();
        let view = store
            .create("projects", "Mine", None, ViewSnapshot::default())
            .unwrap();

        assert!(store.delete(&view.id).unwrap());
        // Second delete is a no-op, not an error
        assert!(!store.delete(&view.id).unwrap());
    }
}
