// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The consolidated, copy-on-read view the watcher maintains.

use crate::{Life, RelationId, ResolvedMode, StorageTag, UnitName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A relation the unit is in scope for, and the settings versions of its
/// currently-visible peer units.
///
/// `members` maps each peer unit name to the settings version last
/// observed for it. A unit missing from the map has either never joined
/// or has since departed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub life: Life,
    pub members: HashMap<UnitName, u64>,
}

impl RelationSnapshot {
    pub fn new(life: Life) -> Self {
        Self { life, members: HashMap::new() }
    }

    /// Apply a relation-units delta: insert/update `changed`, remove `departed`.
    pub fn apply_delta(
        &mut self,
        changed: impl IntoIterator<Item = (UnitName, u64)>,
        departed: impl IntoIterator<Item = UnitName>,
    ) {
        for (unit, version) in changed {
            self.members.insert(unit, version);
        }
        for unit in departed {
            self.members.remove(&unit);
        }
    }
}

/// Kind of durable resource backing a storage attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    Block,
    Filesystem,
}

/// Attachment-specific detail reported alongside a storage attachment's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAttachmentInfo {
    pub kind: StorageKind,
    pub location: String,
    pub attached: bool,
}

/// A storage attachment the unit currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    pub tag: StorageTag,
    pub life: Life,
    pub attachment: Option<StorageAttachmentInfo>,
}

impl StorageSnapshot {
    pub fn new(tag: StorageTag, life: Life) -> Self {
        Self { tag, life, attachment: None }
    }
}

/// The authoritative consolidated view of one unit's server-side state.
///
/// Produced exclusively by the aggregator loop in `rsw-watcher` and
/// handed out as a deep copy by `Snapshot()`/`snapshot()` so that a
/// reader never observes a torn update (see invariants 1-5 in the
/// watcher's module documentation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub life: Life,
    pub resolved_mode: ResolvedMode,
    pub charm_url: Option<String>,
    pub force_charm_upgrade: bool,
    pub config_version: u64,
    pub leader_settings_version: u64,
    pub leader: bool,
    pub relations: HashMap<RelationId, RelationSnapshot>,
    pub storage: HashMap<StorageTag, StorageSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_delta_inserts_changed_and_drops_departed() {
        let mut rel = RelationSnapshot::new(Life::Alive);
        rel.apply_delta([(UnitName::new("svc2/0"), 7)], []);
        assert_eq!(rel.members.get(&UnitName::new("svc2/0")), Some(&7));

        rel.apply_delta(
            [(UnitName::new("svc2/1"), 3)],
            [UnitName::new("svc2/0")],
        );
        assert_eq!(rel.members.len(), 1);
        assert_eq!(rel.members.get(&UnitName::new("svc2/1")), Some(&3));
    }

    #[test]
    fn applying_same_delta_twice_is_idempotent() {
        let mut rel = RelationSnapshot::new(Life::Alive);
        let delta = [(UnitName::new("svc2/0"), 7)];
        rel.apply_delta(delta.clone(), []);
        rel.apply_delta(delta, []);
        assert_eq!(rel.members.len(), 1);
        assert_eq!(rel.members.get(&UnitName::new("svc2/0")), Some(&7));
    }

    #[test]
    fn default_snapshot_has_zeroed_versions() {
        let snap = Snapshot::default();
        assert_eq!(snap.config_version, 0);
        assert_eq!(snap.leader_settings_version, 0);
        assert!(!snap.leader);
        assert!(snap.relations.is_empty());
        assert!(snap.storage.is_empty());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut snap = Snapshot::default();
        snap.config_version = 3;
        snap.relations.insert(RelationId::new(0), RelationSnapshot::new(Life::Alive));
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_support::strategies::arb_relation_delta;
    use proptest::prelude::*;

    proptest! {
        /// Applying the same relations-changed payload twice is a
        /// no-op on `Relations` beyond what the first application
        /// already did.
        #[test]
        fn repeated_delta_application_is_idempotent(
            (changed, departed) in arb_relation_delta(),
        ) {
            let mut once = RelationSnapshot::new(Life::Alive);
            once.apply_delta(changed.clone(), departed.clone());

            let mut twice = RelationSnapshot::new(Life::Alive);
            twice.apply_delta(changed.clone(), departed.clone());
            twice.apply_delta(changed, departed);

            prop_assert_eq!(once, twice);
        }

        /// A unit present in `changed` is never left in `members` if it
        /// also appears in `departed` — `apply_delta` applies changes
        /// before departures, never the other way around.
        #[test]
        fn departed_always_wins_over_changed_in_the_same_delta(
            (changed, departed) in arb_relation_delta(),
        ) {
            let mut rel = RelationSnapshot::new(Life::Alive);
            rel.apply_delta(changed, departed.clone());
            for unit in &departed {
                prop_assert!(!rel.members.contains_key(unit));
            }
        }
    }
}
