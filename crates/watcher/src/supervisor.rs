// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tomb-style lifecycle supervisor.
//!
//! Built from three primitives: a once-settable error cell, a `dying`
//! signal the aggregator's blocking receives select against
//! ([`tokio_util::sync::CancellationToken`]), and a `dead` signal
//! closed once the aggregator loop returns (`tokio::sync::watch`,
//! which — unlike a oneshot — supports the multiple independent
//! subscribers the public surface allows).

use crate::error::WatcherError;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub(crate) struct Supervisor {
    dying: CancellationToken,
    error: Mutex<Option<WatcherError>>,
    dead_tx: watch::Sender<bool>,
    dead_rx: watch::Receiver<bool>,
}

impl Supervisor {
    pub(crate) fn new() -> Self {
        let (dead_tx, dead_rx) = watch::channel(false);
        Self { dying: CancellationToken::new(), error: Mutex::new(None), dead_tx, dead_rx }
    }

    /// The cancellation token every blocking receive in the aggregator
    /// selects against.
    pub(crate) fn dying(&self) -> CancellationToken {
        self.dying.clone()
    }

    /// Request shutdown. Idempotent; does not itself record an error —
    /// a graceful shutdown is not a failure.
    pub(crate) fn kill(&self) {
        self.dying.cancel();
    }

    /// Record the aggregator loop's terminal result and close `dead`.
    ///
    /// [`WatcherError::Dying`] is swallowed here rather than recorded:
    /// it only means the loop noticed a `kill()` that was already
    /// requested, which is not itself a failure to report to `Wait()`.
    pub(crate) fn finish(&self, result: Result<(), WatcherError>) {
        if let Err(err) = result {
            if !matches!(err, WatcherError::Dying) {
                let mut guard = self.error.lock();
                if guard.is_none() {
                    *guard = Some(err);
                }
            }
        }
        let _ = self.dead_tx.send(true);
    }

    /// Block until the aggregator loop has returned, then yield its
    /// recorded error (if any).
    pub(crate) async fn wait(&self) -> Result<(), WatcherError> {
        let mut rx = self.dead_rx.clone();
        let _ = rx.wait_for(|dead| *dead).await;
        match self.error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// A receiver that observes `true` once the aggregator loop has
    /// returned. Multiple independent subscribers are supported.
    pub(crate) fn dead(&self) -> watch::Receiver<bool> {
        self.dead_rx.clone()
    }
}
