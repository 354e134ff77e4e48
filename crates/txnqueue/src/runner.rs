// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded coordination queue runner.

use crate::collection::TxnCollection;
use crate::error::TxnError;
use crate::options::RunnerOptions;
use std::sync::Arc;
use tracing::warn;

/// Applies transactions against one document collection, enforcing
/// a maximum queue length and an assertion-cleanup threshold.
pub struct Runner {
    collection_name: String,
    store: Arc<dyn TxnCollection>,
    options: RunnerOptions,
}

impl Runner {
    /// Create a runner over `collection_name` with default options.
    pub fn new(collection_name: impl Into<String>, store: Arc<dyn TxnCollection>) -> Self {
        Self { collection_name: collection_name.into(), store, options: RunnerOptions::default() }
    }

    /// Replace the whole options value.
    pub fn set_options(&mut self, options: RunnerOptions) {
        self.options = options;
    }

    pub fn options(&self) -> RunnerOptions {
        self.options
    }

    /// Apply a transaction against `document`.
    ///
    /// `assertion_only` marks a transaction that asserts preconditions
    /// without mutating the document; only those are eligible for the
    /// dead-token cleanup path.
    pub async fn apply_transaction(
        &self,
        document: &str,
        txn_token: &str,
        assertion_only: bool,
    ) -> Result<(), TxnError> {
        if self.options.max_txn_queue_length != 0 {
            let length = self.store.queue_length(document).await;
            if length >= self.options.max_txn_queue_length {
                self.store.abort_or_reload(document, txn_token).await?;
                warn!(document, collection = %self.collection_name, length, "txn queue too long, transaction aborted");
                return Err(TxnError::QueueTooLong {
                    document: document.to_string(),
                    collection: self.collection_name.clone(),
                    length,
                });
            }
        }

        self.store.insert_txn_token(document, txn_token).await?;

        if assertion_only && self.options.assertion_cleanup_length != 0 {
            let dead = self.store.dead_tokens(document).await;
            if dead.len() >= self.options.assertion_cleanup_length {
                self.store.pull_tokens(document, &dead).await?;
            }
        }

        Ok(())
    }
}
