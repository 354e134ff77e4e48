// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`TxnCollection`] for testing `Runner` without a real
//! document store.

use crate::collection::TxnCollection;
use crate::error::TxnError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenState {
    Preparing,
    Prepared,
    Dead,
}

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    state: TokenState,
}

/// Driveable fake backing one or more documents' queues.
#[derive(Default)]
pub struct FakeCollection {
    documents: Mutex<HashMap<String, Vec<Entry>>>,
}

impl FakeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `document`'s queue with `count` tokens already in the
    /// `dead` state, simulating a backlog left by upstream chaos.
    pub fn seed_dead_tokens(&self, document: &str, count: usize) {
        let mut docs = self.documents.lock();
        let entries = docs.entry(document.to_string()).or_default();
        for i in 0..count {
            entries.push(Entry { token: format!("dead-{i}"), state: TokenState::Dead });
        }
    }

}

#[async_trait]
impl TxnCollection for FakeCollection {
    async fn queue_length(&self, document: &str) -> usize {
        self.documents.lock().get(document).map(|e| e.len()).unwrap_or(0)
    }

    async fn dead_tokens(&self, document: &str) -> Vec<String> {
        self.documents
            .lock()
            .get(document)
            .into_iter()
            .flatten()
            .filter(|e| e.state == TokenState::Dead)
            .map(|e| e.token.clone())
            .collect()
    }

    async fn abort_or_reload(&self, document: &str, txn_token: &str) -> Result<(), TxnError> {
        let mut docs = self.documents.lock();
        if let Some(entries) = docs.get_mut(document) {
            if let Some(entry) = entries.iter_mut().find(|e| {
                e.token == txn_token
                    && matches!(e.state, TokenState::Preparing | TokenState::Prepared)
            }) {
                entry.state = TokenState::Dead;
            }
        }
        Ok(())
    }

    async fn insert_txn_token(&self, document: &str, txn_token: &str) -> Result<(), TxnError> {
        self.documents
            .lock()
            .entry(document.to_string())
            .or_default()
            .push(Entry { token: txn_token.to_string(), state: TokenState::Preparing });
        Ok(())
    }

    async fn pull_tokens(&self, document: &str, tokens: &[String]) -> Result<(), TxnError> {
        if let Some(entries) = self.documents.lock().get_mut(document) {
            entries.retain(|e| !tokens.contains(&e.token));
        }
        Ok(())
    }
}
