//! Kernel context storage.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use portico_protocols::KernelContext;

/// Concurrency-safe store of kernel contexts keyed by connection id.
///
/// The router is handed a store explicitly; there is no process-wide registry.
pub trait ContextStore: Send + Sync {
    fn get(&self, connection_id: &str) -> Option<Arc<KernelContext>>;

    /// Return the live context for `connection_id`, creating it with `create`
    /// when absent. A closed context is replaced. Lookup and insertion are
    /// atomic with respect to other callers.
    fn get_or_create(
        &self,
        connection_id: &str,
        create: &mut dyn FnMut() -> KernelContext,
    ) -> Arc<KernelContext>;

    fn remove(&self, connection_id: &str) -> Option<Arc<KernelContext>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn connection_ids(&self) -> Vec<String>;
}

/// In-memory context store.
pub struct MemoryContextStore {
    contexts: DashMap<String, Arc<KernelContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self {
            contexts: DashMap::new(),
        }
    }
}

impl Default for MemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore for MemoryContextStore {
    fn get(&self, connection_id: &str) -> Option<Arc<KernelContext>> {
        self.contexts.get(connection_id).map(|c| Arc::clone(c.value()))
    }

    fn get_or_create(
        &self,
        connection_id: &str,
        create: &mut dyn FnMut() -> KernelContext,
    ) -> Arc<KernelContext> {
        match self.contexts.entry(connection_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_closed() {
                    let fresh = Arc::new(create());
                    entry.insert(Arc::clone(&fresh));
                    fresh
                } else {
                    Arc::clone(entry.get())
                }
            }
            Entry::Vacant(entry) => {
                let fresh = Arc::new(create());
                entry.insert(Arc::clone(&fresh));
                fresh
            }
        }
    }

    fn remove(&self, connection_id: &str) -> Option<Arc<KernelContext>> {
        self.contexts.remove(connection_id).map(|(_, c)| c)
    }

    fn len(&self) -> usize {
        self.contexts.len()
    }

    fn connection_ids(&self) -> Vec<String> {
        self.contexts.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(session: &str, connection: &str) -> impl FnMut() -> KernelContext {
        let session = session.to_string();
        let connection = connection.to_string();
        move || KernelContext::new(session.clone(), connection.clone())
    }

    #[test]
    fn test_memory_store_new() {
        let store = MemoryContextStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_or_create_reuses_live_context() {
        let store = MemoryContextStore::new();
        let first = store.get_or_create("c1", &mut create("s1", "c1"));
        let second = store.get_or_create("c1", &mut create("s1", "c1"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_or_create_replaces_closed_context() {
        let store = MemoryContextStore::new();
        let first = store.get_or_create("c1", &mut create("s1", "c1"));
        first.close();

        let second = store.get_or_create("c1", &mut create("s1", "c1"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!second.is_closed());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = MemoryContextStore::new();
        store.get_or_create("c1", &mut create("s1", "c1"));

        assert!(store.remove("c1").is_some());
        assert!(store.remove("c1").is_none());
        assert!(store.get("c1").is_none());
    }

    #[test]
    fn test_connection_ids() {
        let store = MemoryContextStore::default();
        store.get_or_create("c1", &mut create("s1", "c1"));
        store.get_or_create("c2", &mut create("s1", "c2"));

        let mut ids = store.connection_ids();
        ids.sort();
        assert_eq!(ids, vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn test_concurrent_get_or_create_yields_one_context() {
        let store = Arc::new(MemoryContextStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get_or_create("shared", &mut create("s1", "shared")))
            })
            .collect();

        let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(contexts.iter().all(|c| Arc::ptr_eq(c, &contexts[0])));
        assert_eq!(store.len(), 1);
    }
}
