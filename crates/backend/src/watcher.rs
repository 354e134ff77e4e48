// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The uniform source watcher adapter contract.
//!
//! Every one of the nine server-side change streams is wrapped in the
//! same shape: a channel of opaque change tokens, a way to ask why it
//! closed, and a way to tell it to stop. The payload type `T` is the
//! only thing that varies between adapters.

use crate::error::BackendError;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One server-side change-notification stream, wrapped uniformly.
///
/// The first value received is always the initial event: the adapter's
/// producer is required to send the current state unconditionally on
/// subscription.
pub struct SourceWatcher<T> {
    rx: mpsc::Receiver<T>,
    cancel: CancellationToken,
    error: Arc<Mutex<Option<BackendError>>>,
}

impl<T> SourceWatcher<T> {
    /// Construct a watcher around a receiver whose producer records its
    /// terminal error (if any) into `error` before dropping the sender.
    pub fn new(
        rx: mpsc::Receiver<T>,
        cancel: CancellationToken,
        error: Arc<Mutex<Option<BackendError>>>,
    ) -> Self {
        Self { rx, cancel, error }
    }

    /// Receive the next change token. `None` means the channel closed;
    /// callers must then consult [`Self::close_reason`] — closure
    /// without an explicit [`Self::stop`] is an error condition.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Ask the adapter to terminate. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Root cause of an unexpected channel closure, if the producer
    /// recorded one. `None` after a clean [`Self::stop`]-initiated close.
    pub fn close_reason(&self) -> Option<BackendError> {
        self.error.lock().clone()
    }

    /// Whether `stop` was called (a clean, expected closure).
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Producer-side handle paired with a [`SourceWatcher`], used by
/// in-memory / test implementations of the nine adapters.
pub struct SourceWatcherHandle<T> {
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
    error: Arc<Mutex<Option<BackendError>>>,
}

impl<T> SourceWatcherHandle<T> {
    /// Create a watcher/handle pair. `capacity` bounds how many
    /// unconsumed tokens may queue before the producer blocks.
    pub fn channel(capacity: usize) -> (SourceWatcherHandle<T>, SourceWatcher<T>) {
        let (tx, rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let error = Arc::new(Mutex::new(None));
        let handle = SourceWatcherHandle { tx, cancel: cancel.clone(), error: error.clone() };
        let watcher = SourceWatcher::new(rx, cancel, error);
        debug!(capacity, "source watcher channel opened");
        (handle, watcher)
    }

    /// Push a change token to the watcher side.
    pub async fn send(&self, value: T) -> Result<(), mpsc::error::SendError<T>> {
        self.tx.send(value).await
    }

    /// A cloned sender, for callers that need to push from a borrowed
    /// reference without holding a lock across an await point.
    pub fn sender(&self) -> mpsc::Sender<T> {
        self.tx.clone()
    }

    /// Close the channel with an error, simulating an unexpected
    /// upstream failure rather than a clean `stop()`.
    pub fn fail(&self, err: BackendError) {
        debug!(error = %err, "source watcher channel closing with error");
        *self.error.lock() = Some(err);
    }

    pub fn cancelled(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initial_event_is_delivered_unconditionally() {
        let (handle, mut watcher) = SourceWatcherHandle::channel(4);
        handle.send(()).await.unwrap();
        assert_eq!(watcher.next().await, Some(()));
    }

    #[tokio::test]
    async fn stop_is_observable_on_the_watcher_side() {
        let (handle, watcher) = SourceWatcherHandle::channel(4);
        assert!(!watcher.is_stopped());
        watcher.stop();
        assert!(handle.cancelled().is_cancelled());
    }

    #[tokio::test]
    async fn unexpected_close_carries_its_error() {
        let (handle, mut watcher) = SourceWatcherHandle::<()>::channel(4);
        handle.fail(BackendError::Other("connection reset".into()));
        drop(handle);
        assert_eq!(watcher.next().await, None);
        assert!(watcher.close_reason().is_some());
    }
}
