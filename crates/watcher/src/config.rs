// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watcher tunables.

/// Tunables for the aggregator loop's internal channels.
///
/// The set of required initial-gate sources is fixed at eight and is
/// not configurable — adapters are required to guarantee an initial
/// event, so there is nothing to tune there.
#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Capacity of the shared channels the relation-units and
    /// storage-attachment sub-watchers forward into. Bounds how many
    /// unconsumed deltas may queue before a sub-watcher blocks.
    pub sub_watcher_channel_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { sub_watcher_channel_capacity: 64 }
    }
}
