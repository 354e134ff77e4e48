// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The aggregator loop — the only mutator of `Snapshot`.
//!
//! Owns the per-source "initial seen" set, the two dynamic sub-watcher
//! maps, and the single mutex guarding the Snapshot. Everything else in
//! this crate exists to feed tokens into this one `select!`.

use crate::config::WatcherConfig;
use crate::error::WatcherError;
use crate::leadership;
use crate::relation_units;
use crate::storage_attachment;
use crate::sub_watcher::Forwarded;
use parking_lot::Mutex;
use rsw_backend::{BackendError, BackingStore, LeadershipTracker, RelationKeys, StorageKeys};
use rsw_core::{RelationId, RelationSnapshot, Snapshot, StorageSnapshot, StorageTag};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The eight primary sources that must each deliver one initial event
/// before the first external signal is permitted. Fixed, not
/// configurable: adapters are required to guarantee an initial event
/// on subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SourceKind {
    Unit,
    Service,
    Config,
    Addresses,
    Relations,
    Storage,
    LeaderSettings,
    Leadership,
}

const REQUIRED_SOURCES: usize = 8;

#[derive(Default)]
struct InitialGate {
    seen: std::collections::HashSet<SourceKind>,
}

impl InitialGate {
    fn mark(&mut self, kind: SourceKind) {
        self.seen.insert(kind);
    }

    fn is_open(&self) -> bool {
        self.seen.len() >= REQUIRED_SOURCES
    }
}

/// Non-blocking, coalescing signal. A full or closed output channel is
/// not an error here — it just means the consumer hasn't drained the
/// previous signal yet.
fn fire(gate: &InitialGate, changed_tx: &mpsc::Sender<()>) {
    if gate.is_open() {
        let _ = changed_tx.try_send(());
    }
}

/// A primary adapter closing without an explicit `stop()` is always an
/// error condition; `None` only arises from a benign race with our own
/// shutdown and is treated as the same `Dying` sentinel.
fn closed_err(reason: Option<BackendError>) -> WatcherError {
    reason.map(WatcherError::Backend).unwrap_or(WatcherError::Dying)
}

/// Run the aggregator until it terminates. `Gone` is swallowed and
/// looped past; everything else ends the loop.
pub(crate) async fn run(
    store: Arc<dyn BackingStore>,
    leadership: Arc<dyn LeadershipTracker>,
    snapshot: Arc<Mutex<Snapshot>>,
    changed_tx: mpsc::Sender<()>,
    dying: CancellationToken,
    config: WatcherConfig,
) -> Result<(), WatcherError> {
    let leader = match leadership::initial_claim(&leadership, &dying).await {
        Some(leader) => leader,
        None => return Err(WatcherError::Dying),
    };
    snapshot.lock().leader = leader;

    let mut unit_w = store.watch_unit();
    let mut service_w = store.watch_service();
    let mut config_w = store.watch_unit_config();
    let mut addresses_w = store.watch_unit_addresses();
    let mut relations_w = store.watch_service_relations();
    let mut storage_w = store.watch_unit_storage();
    let mut leader_settings_w = store.watch_leader_settings();

    let (leadership_tx, mut leadership_rx) = mpsc::channel(1);
    let leadership_task =
        tokio::spawn(leadership::run(leadership.clone(), leader, leadership_tx, dying.clone()));

    let (ru_tx, mut ru_rx) = mpsc::channel(config.sub_watcher_channel_capacity);
    let (sa_tx, mut sa_rx) = mpsc::channel(config.sub_watcher_channel_capacity);

    let mut relation_tasks: HashMap<RelationId, (JoinHandle<()>, CancellationToken)> =
        HashMap::new();
    let mut storage_tasks: HashMap<StorageTag, (JoinHandle<()>, CancellationToken)> =
        HashMap::new();

    let mut gate = InitialGate::default();
    gate.mark(SourceKind::Leadership);

    let result = loop {
        tokio::select! {
            biased;

            _ = dying.cancelled() => {
                break Err(WatcherError::Dying);
            }

            next = unit_w.next() => {
                match next {
                    Some(()) => match handle_unit(&store, &snapshot).await {
                        Ok(()) => { gate.mark(SourceKind::Unit); fire(&gate, &changed_tx); }
                        Err(err) => break Err(err),
                    },
                    None => break Err(closed_err(unit_w.close_reason())),
                }
            }

            next = service_w.next() => {
                match next {
                    Some(()) => match handle_service(&store, &snapshot).await {
                        Ok(()) => { gate.mark(SourceKind::Service); fire(&gate, &changed_tx); }
                        Err(err) => break Err(err),
                    },
                    None => break Err(closed_err(service_w.close_reason())),
                }
            }

            next = config_w.next() => {
                match next {
                    Some(()) => {
                        snapshot.lock().config_version += 1;
                        gate.mark(SourceKind::Config);
                        fire(&gate, &changed_tx);
                    }
                    None => break Err(closed_err(config_w.close_reason())),
                }
            }

            next = addresses_w.next() => {
                match next {
                    Some(()) => {
                        snapshot.lock().config_version += 1;
                        gate.mark(SourceKind::Addresses);
                        fire(&gate, &changed_tx);
                    }
                    None => break Err(closed_err(addresses_w.close_reason())),
                }
            }

            next = leader_settings_w.next() => {
                match next {
                    Some(()) => {
                        snapshot.lock().leader_settings_version += 1;
                        gate.mark(SourceKind::LeaderSettings);
                        fire(&gate, &changed_tx);
                    }
                    None => break Err(closed_err(leader_settings_w.close_reason())),
                }
            }

            next = relations_w.next() => {
                match next {
                    Some(keys) => {
                        match handle_relations_change(
                            &store, &snapshot, keys, &ru_tx, &dying, &mut relation_tasks,
                        ).await {
                            Ok(()) => { gate.mark(SourceKind::Relations); fire(&gate, &changed_tx); }
                            Err(err) => break Err(err),
                        }
                    }
                    None => break Err(closed_err(relations_w.close_reason())),
                }
            }

            next = storage_w.next() => {
                match next {
                    Some(keys) => {
                        match handle_storage_change(
                            &store, &snapshot, keys, &sa_tx, &dying, &mut storage_tasks,
                        ).await {
                            Ok(()) => { gate.mark(SourceKind::Storage); fire(&gate, &changed_tx); }
                            Err(err) => break Err(err),
                        }
                    }
                    None => break Err(closed_err(storage_w.close_reason())),
                }
            }

            next = leadership_rx.recv() => {
                match next {
                    Some(leader) => {
                        snapshot.lock().leader = leader;
                        fire(&gate, &changed_tx);
                    }
                    None => break Err(WatcherError::Dying),
                }
            }

            next = ru_rx.recv() => {
                match next {
                    Some(Forwarded::Event(id, delta)) => {
                        if let Some(rel) = snapshot.lock().relations.get_mut(&id) {
                            rel.apply_delta(delta.changed, delta.departed);
                        }
                        fire(&gate, &changed_tx);
                    }
                    Some(Forwarded::Closed(id, Some(reason))) => {
                        warn!(relation = %id, %reason, "relation units adapter closed unexpectedly");
                        break Err(WatcherError::Backend(reason));
                    }
                    Some(Forwarded::Closed(_, None)) | None => {}
                }
            }

            next = sa_rx.recv() => {
                match next {
                    Some(Forwarded::Event(tag, ev)) => {
                        handle_storage_event(&snapshot, tag, ev);
                        fire(&gate, &changed_tx);
                    }
                    Some(Forwarded::Closed(tag, Some(reason))) => {
                        warn!(storage = %tag, %reason, "storage attachment adapter closed unexpectedly");
                        break Err(WatcherError::Backend(reason));
                    }
                    Some(Forwarded::Closed(_, None)) | None => {}
                }
            }
        }
    };

    dying.cancel();
    for (id, (task, cancel)) in relation_tasks.drain() {
        cancel.cancel();
        if task.await.is_err() {
            debug!(relation = %id, "relation units sub-watcher task panicked during shutdown");
        }
    }
    for (tag, (task, cancel)) in storage_tasks.drain() {
        cancel.cancel();
        if task.await.is_err() {
            debug!(storage = %tag, "storage attachment sub-watcher task panicked during shutdown");
        }
    }
    let _ = leadership_task.await;

    result
}

async fn handle_unit(store: &Arc<dyn BackingStore>, snapshot: &Mutex<Snapshot>) -> Result<(), WatcherError> {
    match store.unit().await {
        Ok(info) => {
            let mut snap = snapshot.lock();
            snap.life = info.life;
            snap.resolved_mode = info.resolved_mode;
            Ok(())
        }
        Err(err) if err.is_not_found_or_unauthorized() => Err(WatcherError::TerminalAgent),
        Err(err) => Err(WatcherError::Backend(err)),
    }
}

async fn handle_service(
    store: &Arc<dyn BackingStore>,
    snapshot: &Mutex<Snapshot>,
) -> Result<(), WatcherError> {
    match store.service().await {
        Ok(info) => {
            let mut snap = snapshot.lock();
            snap.charm_url = info.charm_url;
            snap.force_charm_upgrade = info.force_charm_upgrade;
            Ok(())
        }
        Err(err) if err.is_not_found_or_unauthorized() => Err(WatcherError::TerminalAgent),
        Err(err) => Err(WatcherError::Backend(err)),
    }
}

async fn handle_relations_change(
    store: &Arc<dyn BackingStore>,
    snapshot: &Mutex<Snapshot>,
    keys: RelationKeys,
    ru_tx: &mpsc::Sender<relation_units::Event>,
    dying: &CancellationToken,
    relation_tasks: &mut HashMap<RelationId, (JoinHandle<()>, CancellationToken)>,
) -> Result<(), WatcherError> {
    for id in keys {
        match store.relation(id).await {
            Err(err) if err.is_not_found_or_unauthorized() => {
                if let Some((task, cancel)) = relation_tasks.remove(&id) {
                    cancel.cancel();
                    let _ = task.await;
                }
                snapshot.lock().relations.remove(&id);
                warn!(relation = %id, "relation gone, sub-watcher stopped");
            }
            Err(err) => return Err(WatcherError::Backend(err)),
            Ok(info) => {
                let already_tracked = snapshot.lock().relations.contains_key(&id);
                if already_tracked {
                    if let Some(rel) = snapshot.lock().relations.get_mut(&id) {
                        rel.life = info.life;
                    }
                } else {
                    let started =
                        relation_units::start(store, id, ru_tx.clone(), dying.clone()).await?;
                    let mut rel = RelationSnapshot::new(info.life);
                    rel.apply_delta(started.initial.changed, started.initial.departed);
                    snapshot.lock().relations.insert(id, rel);
                    relation_tasks.insert(id, (started.task, started.cancel));
                    info!(relation = %id, "relation units sub-watcher started");
                }
            }
        }
    }
    Ok(())
}

async fn handle_storage_change(
    store: &Arc<dyn BackingStore>,
    snapshot: &Mutex<Snapshot>,
    keys: StorageKeys,
    sa_tx: &mpsc::Sender<storage_attachment::Event>,
    dying: &CancellationToken,
    storage_tasks: &mut HashMap<StorageTag, (JoinHandle<()>, CancellationToken)>,
) -> Result<(), WatcherError> {
    let results = store.storage_attachment_life(&keys).await;
    for (tag, result) in results {
        match result {
            Err(err) if err.is_not_found() => {
                if let Some((task, cancel)) = storage_tasks.remove(&tag) {
                    cancel.cancel();
                    let _ = task.await;
                }
                snapshot.lock().storage.remove(&tag);
                warn!(storage = %tag, "storage attachment gone, sub-watcher stopped");
            }
            Err(err) => return Err(WatcherError::Backend(err)),
            Ok(life) => {
                {
                    let mut snap = snapshot.lock();
                    snap.storage
                        .entry(tag.clone())
                        .and_modify(|s| s.life = life)
                        .or_insert_with(|| StorageSnapshot::new(tag.clone(), life));
                }
                if !storage_tasks.contains_key(&tag) {
                    let started = storage_attachment::start(store, tag.clone(), sa_tx.clone(), dying);
                    storage_tasks.insert(tag, (started.task, started.cancel));
                    info!(storage = %tag, "storage attachment sub-watcher started");
                }
            }
        }
    }
    Ok(())
}

fn handle_storage_event(
    snapshot: &Mutex<Snapshot>,
    tag: StorageTag,
    ev: rsw_backend::StorageAttachmentEvent,
) {
    let mut snap = snapshot.lock();
    if ev.remove {
        snap.storage.remove(&tag);
    } else if let Some(entry) = snap.storage.get_mut(&tag) {
        entry.attachment = ev.info;
    }
}
