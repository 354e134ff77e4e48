// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-token payloads carried by the nine source watcher adapters.
//!
//! Adapters do not themselves fetch state — each token carries only
//! the minimum needed to drive a refresh. Most adapters carry `()`:
//! the mere arrival of a token is the signal to re-query the backing
//! store for that slice of state.

use rsw_core::{RelationId, StorageAttachmentInfo, StorageTag, UnitName};
use std::collections::HashMap;

/// Payload of the per-relation-units-change adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationUnitsChange {
    pub changed: HashMap<UnitName, u64>,
    pub departed: Vec<UnitName>,
}

/// Payload of the per-storage-attachment-change adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAttachmentEvent {
    pub tag: StorageTag,
    pub info: Option<StorageAttachmentInfo>,
    pub remove: bool,
}

/// Payload of service-relations-change: the current set of relation keys.
pub type RelationKeys = Vec<RelationId>;

/// Payload of unit-storage-change: the current set of storage keys.
pub type StorageKeys = Vec<StorageTag>;
