//! Per-connection kernel context.
//!
//! A [`KernelContext`] holds the application state of one connection id. It is
//! owned by the router's backing store, not by the worker that drives it, so a
//! reconnect with the same connection id picks the state back up.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};

/// Application state for one connection id.
#[derive(Debug)]
pub struct KernelContext {
    connection_id: String,
    session_id: String,
    created_at: DateTime<Utc>,
    state: RwLock<Map<String, Value>>,
    attached: AtomicUsize,
    closed: AtomicBool,
}

/// Serializable summary of a context.
#[derive(Debug, Clone, Serialize)]
pub struct ContextInfo {
    pub connection_id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub attached: usize,
    pub closed: bool,
    pub keys: usize,
}

impl KernelContext {
    pub fn new(session_id: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            session_id: session_id.into(),
            created_at: Utc::now(),
            state: RwLock::new(Map::new()),
            attached: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.read().get(key).cloned()
    }

    /// Store a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.state.write().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.state.write().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.read().keys().cloned().collect()
    }

    /// Mark a worker as attached until the returned guard is dropped.
    pub fn attach(self: &Arc<Self>) -> AttachGuard {
        self.attached.fetch_add(1, Ordering::SeqCst);
        AttachGuard {
            context: Arc::clone(self),
        }
    }

    /// Number of workers currently driving this context.
    pub fn attached(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    /// Close the context. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::SeqCst);
        if first {
            self.state.write().clear();
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn info(&self) -> ContextInfo {
        ContextInfo {
            connection_id: self.connection_id.clone(),
            session_id: self.session_id.clone(),
            created_at: self.created_at,
            attached: self.attached(),
            closed: self.is_closed(),
            keys: self.state.read().len(),
        }
    }
}

/// Releases a worker attachment on drop.
#[derive(Debug)]
pub struct AttachGuard {
    context: Arc<KernelContext>,
}

impl Drop for AttachGuard {
    fn drop(&mut self) {
        self.context.attached.fetch_sub(1, Ordering::SeqCst);
    }
}
