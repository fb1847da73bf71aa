//! Bridge state shared across handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use portico_config::Config;
use portico_core::{ContextStore, SessionRouter};
use portico_protocols::{AppLoop, PageSource, ReadinessCheck};

use crate::http::monitoring::BridgeReadiness;
use crate::http::page::StaticPage;
use crate::websocket::{ConnectionSupervisor, ConnectionTracker};

/// Bridge state shared across handlers.
pub struct BridgeState {
    pub config: Arc<Config>,
    pub router: Arc<SessionRouter>,
    pub tracker: Arc<ConnectionTracker>,
    pub supervisor: Arc<ConnectionSupervisor>,
    pub page: Arc<dyn PageSource>,
    pub readiness: Arc<dyn ReadinessCheck>,
    /// Cancelled when the server starts shutting down.
    pub shutdown: CancellationToken,
}

impl BridgeState {
    /// State with an in-memory context store, the built-in page and the
    /// built-in readiness check.
    pub fn new(config: Config, app: Arc<dyn AppLoop>) -> Self {
        Self::builder(config, app).build()
    }

    pub fn builder(config: Config, app: Arc<dyn AppLoop>) -> BridgeStateBuilder {
        BridgeStateBuilder {
            config,
            app,
            store: None,
            page: None,
            readiness: None,
            shutdown: None,
        }
    }
}

pub struct BridgeStateBuilder {
    config: Config,
    app: Arc<dyn AppLoop>,
    store: Option<Arc<dyn ContextStore>>,
    page: Option<Arc<dyn PageSource>>,
    readiness: Option<Arc<dyn ReadinessCheck>>,
    shutdown: Option<CancellationToken>,
}

impl BridgeStateBuilder {
    pub fn store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn page(mut self, page: Arc<dyn PageSource>) -> Self {
        self.page = Some(page);
        self
    }

    pub fn readiness(mut self, readiness: Arc<dyn ReadinessCheck>) -> Self {
        self.readiness = Some(readiness);
        self
    }

    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> BridgeState {
        let router = Arc::new(match self.store {
            Some(store) => SessionRouter::new(store),
            None => SessionRouter::in_memory(),
        });
        let shutdown = self.shutdown.unwrap_or_default();
        let tracker = Arc::new(ConnectionTracker::new());
        let supervisor = Arc::new(ConnectionSupervisor::new(
            Arc::clone(&router),
            self.app,
            Arc::clone(&tracker),
            shutdown.clone(),
        ));
        let readiness: Arc<dyn ReadinessCheck> = match self.readiness {
            Some(readiness) => readiness,
            None => Arc::new(BridgeReadiness::new(
                Arc::clone(&router),
                Arc::clone(&tracker),
                shutdown.clone(),
            )),
        };
        let page: Arc<dyn PageSource> = match self.page {
            Some(page) => page,
            None => Arc::new(StaticPage::default()),
        };

        BridgeState {
            config: Arc::new(self.config),
            router,
            tracker,
            supervisor,
            page,
            readiness,
            shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::{MemoryContextStore, StateKernel};

    #[test]
    fn test_bridge_state_defaults() {
        let state = BridgeState::new(Config::default(), Arc::new(StateKernel::new()));
        assert!(state.router.is_empty());
        assert_eq!(state.tracker.active_count(), 0);
        assert!(!state.shutdown.is_cancelled());
    }

    #[test]
    fn test_builder_uses_injected_store_and_token() {
        let store = Arc::new(MemoryContextStore::new());
        let token = CancellationToken::new();
        let state = BridgeState::builder(Config::default(), Arc::new(StateKernel::new()))
            .store(store.clone())
            .shutdown(token.clone())
            .build();

        state.router.resolve("s1", "c1").unwrap();
        assert_eq!(store.len(), 1);

        token.cancel();
        assert!(state.shutdown.is_cancelled());
    }
}
