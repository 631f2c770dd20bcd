//! Engine events
//!
//! Emitted for caller-side side effects: re-rendering, navigation, or
//! triggering a server refresh. State mutation is decoupled from
//! rendering - subscribers observe, they do not mutate.

use uuid::Uuid;

use tabview_core::SortDirection;

/// Events emitted by the table engine
#[derive(Debug, Clone)]
pub enum TableEvent {
    /// An accepted sort change (ignored sorts on non-sortable columns
    /// do not emit)
    SortChanged {
        field: String,
        direction: SortDirection,
    },
    /// One filter entry was set or cleared
    FilterChanged { key: String },
    /// All filters and the search query were reset
    FiltersCleared,
    SearchChanged,
    PageChanged { page: usize },
    SelectionChanged { count: usize },
    ViewSaved { id: Uuid, name: String },
    ViewApplied { name: String },
    BulkActionCompleted { action: String, affected: usize },
}

/// Subscriber list for engine events
///
/// A plain callback registry: each table engine instance owns its own
/// sink, and all emission happens synchronously on the caller's thread.
#[derive(Default)]
pub struct EventSink {
    subscribers: Vec<Box<dyn FnMut(&TableEvent)>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&TableEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn emit(&mut self, event: &TableEvent) {
        tracing::trace!("Emitting {:?}", event);
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_all_subscribers_see_events() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut sink = EventSink::new();

        for tag in ["a", "b"] {
            let seen = seen.clone();
            sink.subscribe(move |event| {
                seen.borrow_mut().push(format!("{}:{:?}", tag, event));
            });
        }

        sink.emit(&TableEvent::SearchChanged);
        sink.emit(&TableEvent::PageChanged { page: 2 });
        assert_eq!(seen.borrow().len(), 4);
    }
}
