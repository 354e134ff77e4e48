// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-attachment sub-watcher.
//!
//! Unlike the relation-units sub-watcher, creation does not block on
//! an initial event: the aggregator already has the current `Life`
//! from the batched storage-attachment-life query before it ever
//! starts this sub-watcher, so there is nothing left to wait for
//! before inserting the map entry.

use crate::sub_watcher::{forward, Forwarded};
use rsw_backend::{BackingStore, StorageAttachmentEvent};
use rsw_core::StorageTag;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub(crate) type Event = Forwarded<StorageTag, StorageAttachmentEvent>;

pub(crate) struct Started {
    pub(crate) task: JoinHandle<()>,
    pub(crate) cancel: CancellationToken,
}

/// Start the sub-watcher for `tag` without waiting on an initial event.
pub(crate) fn start(
    store: &Arc<dyn BackingStore>,
    tag: StorageTag,
    out: mpsc::Sender<Event>,
    dying: &CancellationToken,
) -> Started {
    let watcher = store.watch_storage_attachment(tag.clone());
    let cancel = dying.child_token();
    let task = tokio::spawn(forward(tag, watcher, out, cancel.clone()));
    Started { task, cancel }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsw_backend::FakeBackingStore;
    use rsw_core::{StorageAttachmentInfo, StorageKind};

    #[tokio::test]
    async fn start_forwards_events_without_blocking() {
        let fake = Arc::new(FakeBackingStore::new());
        let store: Arc<dyn BackingStore> = fake.clone();
        let tag = StorageTag::new("storage/0");
        let (out_tx, mut out_rx) = mpsc::channel(4);
        let dying = CancellationToken::new();

        let started = start(&store, tag.clone(), out_tx, &dying);

        let event = StorageAttachmentEvent {
            tag: tag.clone(),
            info: Some(StorageAttachmentInfo {
                kind: StorageKind::Filesystem,
                location: "/srv/data".into(),
                attached: true,
            }),
            remove: false,
        };
        fake.push_storage_attachment(tag.clone(), event.clone()).await;
        match out_rx.recv().await.unwrap() {
            Forwarded::Event(got_tag, got) => {
                assert_eq!(got_tag, tag);
                assert_eq!(got, event);
            }
            Forwarded::Closed(..) => panic!("expected an event"),
        }

        started.cancel.cancel();
        started.task.await.unwrap();
    }
}
