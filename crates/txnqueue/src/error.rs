// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the transaction runner.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TxnError {
    /// The per-document queue already exceeds `MaxTxnQueueLength`; the
    /// candidate transaction was aborted rather than applied.
    #[error("txn-queue for {document} in {collection} has too many transactions ({length})")]
    QueueTooLong { document: String, collection: String, length: usize },

    /// Opaque failure from the backing collection (document store RPC,
    /// connection error, etc.), surfaced unchanged.
    #[error("{0}")]
    Backend(String),
}
