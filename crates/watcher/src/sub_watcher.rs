// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic forwarding task shared by the relation-units and
//! storage-attachment sub-watchers.
//!
//! Both sub-watcher kinds are, underneath, "receive from one adapter,
//! tag the payload with its key, forward into one shared channel,
//! stop on `dying`" — so there is exactly one task body, parameterized
//! over the key type `K` and payload type `T`.

use rsw_backend::{BackendError, SourceWatcher};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a forwarded sub-watcher event means to the aggregator.
pub(crate) enum Forwarded<K, T> {
    /// A change token arrived; refresh using `payload`.
    Event(K, T),
    /// The adapter closed. `None` means a clean `stop()`-initiated
    /// close; `Some` carries the unexpected failure.
    Closed(K, Option<BackendError>),
}

/// Drive `watcher` until it closes or `dying` fires, forwarding every
/// token into `out` tagged with `key`. Stops the adapter itself on
/// `dying` so the close path above runs uniformly either way.
pub(crate) async fn forward<K, T>(
    key: K,
    mut watcher: SourceWatcher<T>,
    out: tokio::sync::mpsc::Sender<Forwarded<K, T>>,
    dying: CancellationToken,
) where
    K: Clone + std::fmt::Display,
{
    loop {
        tokio::select! {
            biased;
            _ = dying.cancelled() => {
                watcher.stop();
                let _ = out.send(Forwarded::Closed(key.clone(), None)).await;
                return;
            }
            next = watcher.next() => {
                match next {
                    Some(payload) => {
                        if out.send(Forwarded::Event(key.clone(), payload)).await.is_err() {
                            return;
                        }
                    }
                    None => {
                        let reason = watcher.close_reason();
                        if reason.is_some() {
                            debug!(key = %key, "sub-watcher closed unexpectedly");
                        }
                        let _ = out.send(Forwarded::Closed(key, reason)).await;
                        return;
                    }
                }
            }
        }
    }
}
