// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory backing store and leadership tracker for testing
//! `rsw-watcher` without a real transport.

use crate::error::BackendError;
use crate::payloads::{RelationKeys, RelationUnitsChange, StorageAttachmentEvent, StorageKeys};
use crate::traits::{BackingStore, LeadershipTracker, RelationInfo, ServiceInfo, UnitInfo};
use crate::watcher::{SourceWatcher, SourceWatcherHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use rsw_core::{Life, RelationId, StorageTag};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Driveable fake implementing [`BackingStore`].
///
/// Each of the nine adapters is backed by an [`SourceWatcherHandle`]
/// the test holds onto to push tokens; lookups and the batched storage
/// query are backed by `Mutex`-guarded cells the test can overwrite.
pub struct FakeBackingStore {
    unit: Mutex<Result<UnitInfo, BackendError>>,
    service: Mutex<Result<ServiceInfo, BackendError>>,
    relations: Mutex<HashMap<RelationId, Result<RelationInfo, BackendError>>>,
    storage_life: Mutex<HashMap<StorageTag, Result<Life, BackendError>>>,

    unit_watch: FakeSlot<()>,
    service_watch: FakeSlot<()>,
    config_watch: FakeSlot<()>,
    addresses_watch: FakeSlot<()>,
    relations_watch: FakeSlot<RelationKeys>,
    storage_watch: FakeSlot<StorageKeys>,
    leader_settings_watch: FakeSlot<()>,

    relation_units_watch: Mutex<HashMap<RelationId, SourceWatcherHandle<RelationUnitsChange>>>,
    storage_attachment_watch: Mutex<HashMap<StorageTag, SourceWatcherHandle<StorageAttachmentEvent>>>,
}

/// A single-use watcher factory slot: holds the producer handle and
/// the consumer watcher until `watch_*` is called exactly once.
struct FakeSlot<T> {
    handle: SourceWatcherHandle<T>,
    watcher: Mutex<Option<SourceWatcher<T>>>,
}

impl<T> FakeSlot<T> {
    fn new(capacity: usize) -> Self {
        let (handle, watcher) = SourceWatcherHandle::channel(capacity);
        Self { handle, watcher: Mutex::new(Some(watcher)) }
    }

    fn take(&self) -> SourceWatcher<T> {
        self.watcher
            .lock()
            .take()
            .unwrap_or_else(|| unreachable!("fake source watcher factory called more than once"))
    }
}

impl FakeBackingStore {
    pub fn new() -> Self {
        Self {
            unit: Mutex::new(Err(BackendError::not_found("unit"))),
            service: Mutex::new(Err(BackendError::not_found("service"))),
            relations: Mutex::new(HashMap::new()),
            storage_life: Mutex::new(HashMap::new()),
            unit_watch: FakeSlot::new(16),
            service_watch: FakeSlot::new(16),
            config_watch: FakeSlot::new(16),
            addresses_watch: FakeSlot::new(16),
            relations_watch: FakeSlot::new(16),
            storage_watch: FakeSlot::new(16),
            leader_settings_watch: FakeSlot::new(16),
            relation_units_watch: Mutex::new(HashMap::new()),
            storage_attachment_watch: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_unit(&self, info: Result<UnitInfo, BackendError>) {
        *self.unit.lock() = info;
    }

    pub fn set_service(&self, info: Result<ServiceInfo, BackendError>) {
        *self.service.lock() = info;
    }

    pub fn set_relation(&self, id: RelationId, info: Result<RelationInfo, BackendError>) {
        self.relations.lock().insert(id, info);
    }

    pub fn set_storage_life(&self, tag: StorageTag, life: Result<Life, BackendError>) {
        self.storage_life.lock().insert(tag, life);
    }

    pub async fn push_unit_change(&self) {
        let _ = self.unit_watch.handle.send(()).await;
    }

    pub async fn push_service_change(&self) {
        let _ = self.service_watch.handle.send(()).await;
    }

    pub async fn push_config_change(&self) {
        let _ = self.config_watch.handle.send(()).await;
    }

    pub async fn push_addresses_change(&self) {
        let _ = self.addresses_watch.handle.send(()).await;
    }

    pub async fn push_relations_change(&self, keys: RelationKeys) {
        let _ = self.relations_watch.handle.send(keys).await;
    }

    pub async fn push_storage_change(&self, keys: StorageKeys) {
        let _ = self.storage_watch.handle.send(keys).await;
    }

    pub async fn push_leader_settings_change(&self) {
        let _ = self.leader_settings_watch.handle.send(()).await;
    }

    /// Push a relation-units delta. The per-relation sub-watcher must
    /// already exist (the aggregator calls `watch_relation_units`
    /// before this can be driven).
    pub async fn push_relation_units(&self, id: RelationId, delta: RelationUnitsChange) {
        let sender = self.relation_units_watch.lock().get(&id).map(|h| h.sender());
        if let Some(sender) = sender {
            let _ = sender.send(delta).await;
        }
    }

    pub async fn push_storage_attachment(&self, tag: StorageTag, event: StorageAttachmentEvent) {
        let sender = self.storage_attachment_watch.lock().get(&tag).map(|h| h.sender());
        if let Some(sender) = sender {
            let _ = sender.send(event).await;
        }
    }
}

impl Default for FakeBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackingStore for FakeBackingStore {
    async fn unit(&self) -> Result<UnitInfo, BackendError> {
        self.unit.lock().clone()
    }

    async fn service(&self) -> Result<ServiceInfo, BackendError> {
        self.service.lock().clone()
    }

    async fn relation(&self, id: RelationId) -> Result<RelationInfo, BackendError> {
        self.relations
            .lock()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Err(BackendError::not_found(format!("relation {id}"))))
    }

    async fn storage_attachment_life(
        &self,
        tags: &[StorageTag],
    ) -> Vec<(StorageTag, Result<Life, BackendError>)> {
        let guard = self.storage_life.lock();
        tags.iter()
            .map(|tag| {
                let result = guard
                    .get(tag)
                    .cloned()
                    .unwrap_or_else(|| Err(BackendError::not_found(format!("storage {tag}"))));
                (tag.clone(), result)
            })
            .collect()
    }

    fn watch_unit(&self) -> SourceWatcher<()> {
        self.unit_watch.take()
    }

    fn watch_service(&self) -> SourceWatcher<()> {
        self.service_watch.take()
    }

    fn watch_unit_config(&self) -> SourceWatcher<()> {
        self.config_watch.take()
    }

    fn watch_unit_addresses(&self) -> SourceWatcher<()> {
        self.addresses_watch.take()
    }

    fn watch_service_relations(&self) -> SourceWatcher<RelationKeys> {
        self.relations_watch.take()
    }

    fn watch_unit_storage(&self) -> SourceWatcher<StorageKeys> {
        self.storage_watch.take()
    }

    fn watch_leader_settings(&self) -> SourceWatcher<()> {
        self.leader_settings_watch.take()
    }

    fn watch_relation_units(&self, id: RelationId) -> SourceWatcher<RelationUnitsChange> {
        let (handle, watcher) = SourceWatcherHandle::channel(16);
        self.relation_units_watch.lock().insert(id, handle);
        watcher
    }

    fn watch_storage_attachment(&self, tag: StorageTag) -> SourceWatcher<StorageAttachmentEvent> {
        let (handle, watcher) = SourceWatcherHandle::channel(16);
        self.storage_attachment_watch.lock().insert(tag, handle);
        watcher
    }
}

/// Driveable fake implementing [`LeadershipTracker`].
///
/// `claim_leader` resolves from a single preset outcome; `wait_leader`/
/// `wait_minion` each block on a [`Notify`] the test fires to simulate
/// the tracker handing the unit that role.
pub struct FakeLeadershipTracker {
    claim_result: Mutex<bool>,
    leader_notify: Notify,
    minion_notify: Notify,
}

impl FakeLeadershipTracker {
    pub fn new(initial_claim: bool) -> Self {
        Self {
            claim_result: Mutex::new(initial_claim),
            leader_notify: Notify::new(),
            minion_notify: Notify::new(),
        }
    }

    pub fn fire_leader(&self) {
        self.leader_notify.notify_one();
    }

    pub fn fire_minion(&self) {
        self.minion_notify.notify_one();
    }
}

#[async_trait]
impl LeadershipTracker for FakeLeadershipTracker {
    async fn claim_leader(&self) -> bool {
        *self.claim_result.lock()
    }

    async fn wait_leader(&self) {
        self.leader_notify.notified().await;
    }

    async fn wait_minion(&self) {
        self.minion_notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{RelationInfo, UnitInfo};
    use rsw_core::ResolvedMode;

    #[tokio::test]
    async fn unit_lookup_reflects_set_value() {
        let store = FakeBackingStore::new();
        store.set_unit(Ok(UnitInfo { life: Life::Alive, resolved_mode: ResolvedMode::None }));
        let info = store.unit().await.unwrap();
        assert_eq!(info.life, Life::Alive);
    }

    #[tokio::test]
    async fn watch_unit_delivers_pushed_token() {
        let store = FakeBackingStore::new();
        let mut watcher = store.watch_unit();
        store.push_unit_change().await;
        assert_eq!(watcher.next().await, Some(()));
    }

    #[tokio::test]
    async fn watch_relation_units_delivers_delta_after_creation() {
        let store = FakeBackingStore::new();
        let id = RelationId::new(0);
        let mut watcher = store.watch_relation_units(id);
        let delta = RelationUnitsChange::default();
        store.push_relation_units(id, delta.clone()).await;
        assert_eq!(watcher.next().await, Some(delta));
    }

    #[tokio::test]
    async fn storage_attachment_life_batch_reports_not_found_for_unknown_tag() {
        let store = FakeBackingStore::new();
        let results = store.storage_attachment_life(&[StorageTag::new("storage/0")]).await;
        assert!(results[0].1.as_ref().unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn leadership_claim_then_flip_flop() {
        let tracker = Arc::new(FakeLeadershipTracker::new(true));
        assert!(tracker.claim_leader().await);

        let waiter = tokio::spawn({
            let tracker = tracker.clone();
            async move {
                tracker.wait_minion().await;
            }
        });
        tracker.fire_minion();
        waiter.await.unwrap();
    }

    #[allow(dead_code)]
    fn _relation_info_is_copy(info: RelationInfo) -> RelationInfo {
        info
    }
}
