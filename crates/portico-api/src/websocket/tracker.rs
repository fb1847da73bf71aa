//! Connection lifecycle tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use super::supervisor::{ConnectionIds, Termination};

/// Lifecycle of one WebSocket attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Pending,
    Accepted,
    Running,
    Terminated { clean: bool },
}

impl ConnectionState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRecord {
    pub session_id: String,
    pub connection_id: String,
    pub state: ConnectionState,
    pub opened_at: DateTime<Utc>,
}

/// Connection counters for the readiness surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub active: usize,
    pub running: usize,
    pub clean_total: u64,
    pub error_total: u64,
}

/// Tracks live connection attempts, keyed by a per-attempt id.
///
/// Terminated attempts are dropped from the map and only counted.
pub struct ConnectionTracker {
    connections: DashMap<Uuid, ConnectionRecord>,
    clean_total: AtomicU64,
    error_total: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            clean_total: AtomicU64::new(0),
            error_total: AtomicU64::new(0),
        }
    }

    /// Record a new attempt in the `Pending` state.
    pub fn register(&self, ids: &ConnectionIds) -> Uuid {
        let attempt = Uuid::new_v4();
        self.connections.insert(
            attempt,
            ConnectionRecord {
                session_id: ids.session_id.clone(),
                connection_id: ids.connection_id.clone(),
                state: ConnectionState::Pending,
                opened_at: Utc::now(),
            },
        );
        attempt
    }

    /// Register an attempt whose record is finished when the returned handle
    /// is, or dropped.
    pub fn track(self: &Arc<Self>, ids: &ConnectionIds) -> TrackedAttempt {
        TrackedAttempt {
            tracker: Arc::clone(self),
            attempt: self.register(ids),
            finished: false,
        }
    }

    /// Move an attempt forward. Returns false for unknown or finished attempts.
    pub fn transition(&self, attempt: Uuid, state: ConnectionState) -> bool {
        match self.connections.get_mut(&attempt) {
            Some(mut record) if !record.state.is_terminated() => {
                record.state = state;
                true
            }
            _ => false,
        }
    }

    /// Finish an attempt and return its final record.
    pub fn finish(&self, attempt: Uuid, termination: &Termination) -> Option<ConnectionRecord> {
        let (_, mut record) = self.connections.remove(&attempt)?;
        let clean = termination.is_clean();
        record.state = ConnectionState::Terminated { clean };
        if clean {
            self.clean_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.error_total.fetch_add(1, Ordering::Relaxed);
        }
        Some(record)
    }

    /// Number of attempts not yet terminated.
    pub fn active_count(&self) -> usize {
        self.connections.len()
    }

    pub fn stats(&self) -> TrackerStats {
        let running = self
            .connections
            .iter()
            .filter(|r| r.state == ConnectionState::Running)
            .count();
        TrackerStats {
            active: self.connections.len(),
            running,
            clean_total: self.clean_total.load(Ordering::Relaxed),
            error_total: self.error_total.load(Ordering::Relaxed),
        }
    }
}

/// A registered attempt.
///
/// Dropping it without [`TrackedAttempt::finish`] terminates the record as
/// unclean, so an abandoned supervisor never leaves a live entry behind.
pub struct TrackedAttempt {
    tracker: Arc<ConnectionTracker>,
    attempt: Uuid,
    finished: bool,
}

impl TrackedAttempt {
    pub fn transition(&self, state: ConnectionState) -> bool {
        self.tracker.transition(self.attempt, state)
    }

    pub fn finish(mut self, termination: &Termination) -> Option<ConnectionRecord> {
        self.finished = true;
        self.tracker.finish(self.attempt, termination)
    }
}

impl Drop for TrackedAttempt {
    fn drop(&mut self) {
        if !self.finished {
            let termination = Termination::Faulted("supervision dropped".to_string());
            self.tracker.finish(self.attempt, &termination);
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> ConnectionIds {
        ConnectionIds {
            session_id: "s1".to_string(),
            connection_id: "c1".to_string(),
        }
    }

    #[test]
    fn test_tracker_new() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.stats(), TrackerStats::default());
    }

    #[test]
    fn test_register_starts_pending() {
        let tracker = ConnectionTracker::new();
        let attempt = tracker.register(&ids());
        assert_eq!(tracker.active_count(), 1);

        let record = tracker.finish(attempt, &Termination::Completed).unwrap();
        assert_eq!(record.connection_id, "c1");
        assert_eq!(record.session_id, "s1");
    }

    #[test]
    fn test_transitions_and_running_count() {
        let tracker = ConnectionTracker::new();
        let attempt = tracker.register(&ids());

        assert!(tracker.transition(attempt, ConnectionState::Accepted));
        assert!(tracker.transition(attempt, ConnectionState::Running));
        assert_eq!(tracker.stats().running, 1);
    }

    #[test]
    fn test_finish_counts_clean_and_error() {
        let tracker = ConnectionTracker::new();
        let a = tracker.register(&ids());
        let b = tracker.register(&ids());

        let record = tracker.finish(a, &Termination::Disconnected).unwrap();
        assert_eq!(record.state, ConnectionState::Terminated { clean: true });
        tracker.finish(b, &Termination::Faulted("boom".to_string()));

        let stats = tracker.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.clean_total, 1);
        assert_eq!(stats.error_total, 1);
    }

    #[test]
    fn test_no_transition_after_finish() {
        let tracker = ConnectionTracker::new();
        let attempt = tracker.register(&ids());
        tracker.finish(attempt, &Termination::Completed);

        assert!(!tracker.transition(attempt, ConnectionState::Running));
        assert!(tracker.finish(attempt, &Termination::Completed).is_none());
        assert_eq!(tracker.stats().clean_total, 1);
    }

    #[test]
    fn test_tracked_attempt_finish() {
        let tracker = Arc::new(ConnectionTracker::new());
        let attempt = tracker.track(&ids());
        assert!(attempt.transition(ConnectionState::Running));
        assert_eq!(tracker.stats().running, 1);

        let record = attempt.finish(&Termination::Disconnected).unwrap();
        assert_eq!(record.state, ConnectionState::Terminated { clean: true });
        assert_eq!(tracker.stats().clean_total, 1);
        assert_eq!(tracker.stats().error_total, 0);
    }

    #[test]
    fn test_dropped_attempt_is_terminated() {
        let tracker = Arc::new(ConnectionTracker::new());
        let attempt = tracker.track(&ids());
        attempt.transition(ConnectionState::Running);

        drop(attempt);

        let stats = tracker.stats();
        assert_eq!(stats.active, 0);
        assert_eq!(stats.running, 0);
        assert_eq!(stats.error_total, 1);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(ConnectionState::Terminated { clean: false }).unwrap();
        assert_eq!(json["state"], "terminated");
        assert_eq!(json["clean"], false);
    }
}
