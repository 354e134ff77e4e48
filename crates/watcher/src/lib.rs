// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rsw-watcher: the Remote State Watcher aggregator.
//!
//! Fans in every server-side change stream for one unit into a single
//! consolidated [`rsw_core::Snapshot`] and emits a coalesced change
//! signal to exactly one consumer. See [`RemoteStateWatcher::spawn`].

mod aggregator;
mod config;
mod error;
mod leadership;
mod relation_units;
mod storage_attachment;
mod sub_watcher;
mod supervisor;

pub use config::WatcherConfig;
pub use error::WatcherError;

use parking_lot::Mutex;
use rsw_backend::{BackingStore, LeadershipTracker};
use rsw_core::{ResolvedMode, Snapshot};
use std::sync::Arc;
use supervisor::Supervisor;
use tokio::sync::{mpsc, watch};

/// A running remote state watcher for one unit.
///
/// Holds no lock across an await: reads clone the Snapshot under a
/// short-lived `parking_lot::Mutex` guard, and lifecycle methods defer
/// entirely to the inner [`Supervisor`].
pub struct RemoteStateWatcher {
    snapshot: Arc<Mutex<Snapshot>>,
    supervisor: Arc<Supervisor>,
}

impl RemoteStateWatcher {
    /// Spawn the aggregator loop (and, once the initial leadership
    /// claim resolves, the leadership bridge task).
    ///
    /// Returns the handle together with the coalesced change receiver.
    /// The receiver is handed out by value rather than behind a
    /// runtime-checked `.take()`: Rust's ownership model already
    /// enforces the "exactly one consumer" contract without needing a
    /// panic path.
    pub fn spawn(
        store: Arc<dyn BackingStore>,
        leadership: Arc<dyn LeadershipTracker>,
        config: WatcherConfig,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let snapshot = Arc::new(Mutex::new(Snapshot::default()));
        let supervisor = Arc::new(Supervisor::new());
        let (changed_tx, changed_rx) = mpsc::channel(1);

        let dying = supervisor.dying();
        let loop_snapshot = snapshot.clone();
        let loop_supervisor = supervisor.clone();
        tokio::spawn(async move {
            let result =
                aggregator::run(store, leadership, loop_snapshot, changed_tx, dying, config).await;
            loop_supervisor.finish(result);
        });

        (Arc::new(Self { snapshot, supervisor }), changed_rx)
    }

    /// A deep copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().clone()
    }

    /// Clear `resolved_mode` in place. The only externally-triggered
    /// state mutation; emits no change signal.
    pub fn clear_resolved_mode(&self) {
        self.snapshot.lock().resolved_mode = ResolvedMode::None;
    }

    /// Request cooperative shutdown. Idempotent; always graceful — a
    /// real failure can only be recorded by the aggregator loop itself
    /// returning an error.
    pub fn kill(&self) {
        self.supervisor.kill();
    }

    /// Block until the aggregator loop has exited.
    pub async fn wait(&self) -> Result<(), WatcherError> {
        self.supervisor.wait().await
    }

    /// Observe loop exit without consuming anything; supports any
    /// number of independent subscribers.
    pub fn dead(&self) -> watch::Receiver<bool> {
        self.supervisor.dead()
    }

    /// `kill()` followed by `wait()`.
    pub async fn stop(&self) -> Result<(), WatcherError> {
        self.kill();
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsw_backend::{FakeBackingStore, FakeLeadershipTracker, ServiceInfo, UnitInfo};
    use rsw_core::Life;

    #[tokio::test]
    async fn spawn_reaches_quiescence_and_reports_a_snapshot() {
        let store = Arc::new(FakeBackingStore::new());
        store.set_unit(Ok(UnitInfo { life: Life::Alive, resolved_mode: ResolvedMode::None }));
        store.set_service(Ok(ServiceInfo { charm_url: None, force_charm_upgrade: false }));
        let leadership = Arc::new(FakeLeadershipTracker::new(false));

        let (watcher, mut changed) =
            RemoteStateWatcher::spawn(store.clone(), leadership, WatcherConfig::default());

        store.push_unit_change().await;
        store.push_service_change().await;
        store.push_config_change().await;
        store.push_addresses_change().await;
        store.push_relations_change(vec![]).await;
        store.push_storage_change(vec![]).await;
        store.push_leader_settings_change().await;

        changed.recv().await.expect("coalesced signal after initial gate opens");
        let snap = watcher.snapshot();
        assert_eq!(snap.life, Life::Alive);
        assert!(!snap.leader);

        assert!(watcher.stop().await.is_ok());
    }

    #[tokio::test]
    async fn clear_resolved_mode_does_not_signal() {
        let store = Arc::new(FakeBackingStore::new());
        let leadership = Arc::new(FakeLeadershipTracker::new(false));
        let (watcher, mut changed) =
            RemoteStateWatcher::spawn(store, leadership, WatcherConfig::default());

        watcher.clear_resolved_mode();
        assert!(changed.try_recv().is_err());
        assert_eq!(watcher.snapshot().resolved_mode, ResolvedMode::None);

        watcher.kill();
        let _ = watcher.wait().await;
    }

    #[tokio::test]
    async fn terminal_agent_is_reported_by_wait() {
        let store = Arc::new(FakeBackingStore::new());
        store.set_unit(Err(rsw_backend::BackendError::not_found("unit u/0")));
        let leadership = Arc::new(FakeLeadershipTracker::new(false));
        let (watcher, _changed) =
            RemoteStateWatcher::spawn(store.clone(), leadership, WatcherConfig::default());

        store.push_unit_change().await;
        let result = watcher.wait().await;
        assert!(matches!(result, Err(WatcherError::TerminalAgent)));
    }
}
