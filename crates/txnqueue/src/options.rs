// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner tunables. `SetOptions`-style callers replace the whole
//! value rather than patching individual fields.

/// Bounds on a per-document coordination queue. `0` disables the
/// corresponding check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Reject (abort) a transaction rather than apply it once a
    /// document's queue already holds at least this many tokens.
    /// Most queue operations are quadratic in length; long queues
    /// indicate an upstream bug, not legitimate load.
    pub max_txn_queue_length: usize,
    /// Once a pure-assertion transaction's accumulated dead-token
    /// pull-set reaches this size, issue a cleanup that pulls them
    /// from the queue rather than letting tombstones accumulate
    /// unbounded on an otherwise-unmodified document.
    pub assertion_cleanup_length: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self { max_txn_queue_length: 1000, assertion_cleanup_length: 10 }
    }
}
