// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relation-units sub-watcher.
//!
//! Creation blocks on the adapter's initial event so the aggregator
//! can seed `Members` before the relation is visible in the Snapshot.

use crate::error::WatcherError;
use crate::sub_watcher::{forward, Forwarded};
use rsw_backend::{BackendError, BackingStore, RelationUnitsChange};
use rsw_core::RelationId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) type Event = Forwarded<RelationId, RelationUnitsChange>;

/// A running sub-watcher and the initial delta it blocked on.
pub(crate) struct Started {
    pub(crate) initial: RelationUnitsChange,
    pub(crate) task: JoinHandle<()>,
    pub(crate) cancel: CancellationToken,
}

/// Start the sub-watcher for `id`, blocking until its initial event.
///
/// `cancel` is this sub-watcher's own token: stopping it (without
/// killing the whole watcher) happens when the relation is later
/// reported gone, independent of the aggregator's `dying` token.
pub(crate) async fn start(
    store: &Arc<dyn BackingStore>,
    id: RelationId,
    out: mpsc::Sender<Event>,
    dying: CancellationToken,
) -> Result<Started, WatcherError> {
    let mut watcher = store.watch_relation_units(id);
    let initial = watcher.next().await.ok_or_else(|| {
        watcher
            .close_reason()
            .map(WatcherError::Backend)
            .unwrap_or_else(|| {
                WatcherError::Backend(BackendError::Other(format!(
                    "relation {id} units adapter closed before its initial event"
                )))
            })
    })?;

    // A child token: cancelling it (the relation reported gone) stops
    // only this sub-watcher, while cancelling `dying` (whole-watcher
    // shutdown) cascades down to it and every other child.
    let cancel = dying.child_token();
    let task = tokio::spawn(forward(id, watcher, out, cancel.clone()));
    Ok(Started { initial, task, cancel })
}
