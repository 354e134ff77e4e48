// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds the aggregator loop can terminate with.

use rsw_backend::BackendError;
use thiserror::Error;

/// Why the watcher stopped running.
#[derive(Debug, Clone, Error)]
pub enum WatcherError {
    /// The initial unit or service lookup came back not-found or
    /// unauthorized. The embedding agent should exit.
    #[error("unit is gone or unauthorized; agent should exit")]
    TerminalAgent,

    /// Cooperative shutdown sentinel. Never surfaced to `wait()` after
    /// a graceful `kill()` — see [`crate::supervisor::Supervisor::finish`].
    #[error("watcher is dying")]
    Dying,

    /// Any other backing-store failure, surfaced unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
