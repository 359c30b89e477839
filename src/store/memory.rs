//! Process-lifetime order records.
//!
//! Lost on restart and not shared between instances; a durable backend is
//! the source of truth when one is configured.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of order ids answered by this process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    processed: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn processed(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked mid-insert.
        self.processed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_processed(&self, order_id: &str) -> bool {
        self.processed().contains(order_id)
    }

    /// Returns `false` if the id was already present.
    pub fn mark_processed(&self, order_id: &str) -> bool {
        self.processed().insert(order_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.processed().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── In-flight claims ────────────────────────────────────────────────

/// Order ids whose reply is being generated right now.
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `order_id`. Returns `None` if another request holds it.
    ///
    /// The reservation is released when the returned guard is dropped.
    pub fn claim(&self, order_id: &str) -> Option<InFlightGuard> {
        let mut ids = lock_ids(&self.ids);
        if !ids.insert(order_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            ids: Arc::clone(&self.ids),
            order_id: order_id.to_string(),
        })
    }

    pub fn contains(&self, order_id: &str) -> bool {
        lock_ids(&self.ids).contains(order_id)
    }
}

/// Holds an in-flight reservation; releases it on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    order_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock_ids(&self.ids).remove(&self.order_id);
    }
}

fn lock_ids(ids: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_ids_are_remembered() {
        let store = MemoryStore::new();

        assert!(!store.is_processed("42"));
        store.mark_processed("42");
        assert!(store.is_processed("42"));
        assert!(!store.is_processed("43"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mark_processed_reports_first_insert() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert!(store.mark_processed("a"));
        assert!(!store.mark_processed("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn claim_is_exclusive_until_dropped() {
        let in_flight = InFlight::new();

        let guard = in_flight.claim("42").expect("first claim succeeds");
        assert!(in_flight.contains("42"));
        assert!(in_flight.claim("42").is_none());
        assert!(in_flight.claim("43").is_some());

        drop(guard);
        assert!(!in_flight.contains("42"));
        assert!(in_flight.claim("42").is_some());
    }

    #[test]
    fn concurrent_marks_are_counted_once() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.mark_processed("same"))
            })
            .collect();
        let firsts = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|first| *first)
            .count();
        assert_eq!(firsts, 1);
        assert_eq!(store.len(), 1);
    }
}
