//! Session router.
//!
//! Maps a (session id, connection id) pair to the kernel context that serves
//! it. Contexts are keyed by connection id alone: two connections of the same
//! browser session get separate kernels, and a reconnect with a known
//! connection id picks up the state it left behind.

use std::sync::Arc;

use tracing::{debug, info, warn};

use portico_protocols::KernelContext;

use crate::error::RouterError;
use crate::store::{ContextStore, MemoryContextStore};

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

pub struct SessionRouter {
    store: Arc<dyn ContextStore>,
}

impl SessionRouter {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self { store }
    }

    /// Router backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryContextStore::new()))
    }

    /// Look up the context for `connection_id`, creating it on first use.
    pub fn resolve(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Result<Arc<KernelContext>, RouterError> {
        if session_id.is_empty() {
            return Err(RouterError::MissingIdentifier("session_id"));
        }
        if connection_id.is_empty() {
            return Err(RouterError::MissingIdentifier("connection_id"));
        }

        let mut created = false;
        let context = self.store.get_or_create(connection_id, &mut || {
            created = true;
            KernelContext::new(session_id, connection_id)
        });

        if context.session_id() != session_id {
            warn!(
                connection_id,
                session_id,
                owner = context.session_id(),
                "Connection id is bound to another session"
            );
            return Err(RouterError::SessionMismatch {
                connection_id: connection_id.to_string(),
            });
        }

        if created {
            info!(connection_id, session_id, "Kernel context created");
        } else {
            debug!(connection_id, session_id, "Kernel context reused");
        }
        Ok(context)
    }

    /// Close and forget the context for `connection_id`.
    ///
    /// Returns whether a context existed. Closing twice is harmless.
    pub fn close(&self, connection_id: &str) -> bool {
        match self.store.remove(connection_id) {
            Some(context) => {
                let summary = context.info();
                context.close();
                info!(
                    connection_id,
                    session_id = %summary.session_id,
                    attached = summary.attached,
                    keys = summary.keys,
                    created_at = %summary.created_at,
                    "Kernel context closed"
                );
                true
            }
            None => {
                debug!(connection_id, "No kernel context to close");
                false
            }
        }
    }

    pub fn get(&self, connection_id: &str) -> Option<Arc<KernelContext>> {
        self.store.get(connection_id)
    }

    /// Number of known contexts.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn connection_ids(&self) -> Vec<String> {
        self.store.connection_ids()
    }
}

impl Default for SessionRouter {
    fn default() -> Self {
        Self::in_memory()
    }
}
