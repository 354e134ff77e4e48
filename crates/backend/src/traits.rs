// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The upstream backing store and leadership tracker surfaces,
//! expressed as traits so `rsw-watcher` never names a concrete
//! transport.

use crate::error::BackendError;
use crate::payloads::{RelationKeys, RelationUnitsChange, StorageAttachmentEvent, StorageKeys};
use crate::watcher::SourceWatcher;
use async_trait::async_trait;
use rsw_core::{Life, RelationId, ResolvedMode, StorageTag};

/// Unit facts refreshed by the unit-change adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInfo {
    pub life: Life,
    pub resolved_mode: ResolvedMode,
}

/// Service facts refreshed by the service-change adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub charm_url: Option<String>,
    pub force_charm_upgrade: bool,
}

/// Relation facts refreshed by the relations-change handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationInfo {
    pub life: Life,
}

/// The abstract backing store: lookups, a batched storage query, and
/// nine watcher-factory calls, one per primary change source.
///
/// Object-safe so the watcher can hold it behind an `Arc<dyn
/// BackingStore>` without knowing the concrete transport.
#[async_trait]
pub trait BackingStore: Send + Sync {
    async fn unit(&self) -> Result<UnitInfo, BackendError>;
    async fn service(&self) -> Result<ServiceInfo, BackendError>;
    async fn relation(&self, id: RelationId) -> Result<RelationInfo, BackendError>;

    /// Batched life query: one result per tag, in the same order.
    /// Per-tag not-found is a normal removal, not propagated as an
    /// overall failure.
    async fn storage_attachment_life(
        &self,
        tags: &[StorageTag],
    ) -> Vec<(StorageTag, Result<Life, BackendError>)>;

    fn watch_unit(&self) -> SourceWatcher<()>;
    fn watch_service(&self) -> SourceWatcher<()>;
    fn watch_unit_config(&self) -> SourceWatcher<()>;
    fn watch_unit_addresses(&self) -> SourceWatcher<()>;
    fn watch_service_relations(&self) -> SourceWatcher<RelationKeys>;
    fn watch_unit_storage(&self) -> SourceWatcher<StorageKeys>;
    fn watch_leader_settings(&self) -> SourceWatcher<()>;
    fn watch_relation_units(&self, id: RelationId) -> SourceWatcher<RelationUnitsChange>;
    fn watch_storage_attachment(&self, tag: StorageTag) -> SourceWatcher<StorageAttachmentEvent>;
}

/// The external leadership tracker surface.
///
/// `claim_leader` resolves the startup claim; `wait_leader`/
/// `wait_minion` each resolve the next time the unit should flip to
/// that role. Modeled as plain async methods rather than a
/// ready/wait channel pair: a caller that needs to race the claim
/// against shutdown does so with `tokio::select!` against a
/// `CancellationToken`, which is the idiomatic equivalent of "select
/// against dying" here.
#[async_trait]
pub trait LeadershipTracker: Send + Sync {
    /// Blocks until the initial leader/minion claim resolves.
    async fn claim_leader(&self) -> bool;
    /// Blocks until this unit should become leader.
    async fn wait_leader(&self);
    /// Blocks until this unit should become minion.
    async fn wait_minion(&self);
}
