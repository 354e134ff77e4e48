// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Life, RelationSnapshot, UnitName};

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_life() -> impl Strategy<Value = Life> {
        prop_oneof![Just(Life::Alive), Just(Life::Dying), Just(Life::Dead)]
    }

    pub fn arb_unit_name() -> impl Strategy<Value = UnitName> {
        "[a-z]{2,6}/[0-9]{1,2}".prop_map(UnitName::new)
    }

    /// A relation-units delta: a set of (unit, version) changes and a
    /// disjoint set of departures, used to drive invariant 6
    /// (idempotent delta application).
    pub fn arb_relation_delta(
    ) -> impl Strategy<Value = (Vec<(UnitName, u64)>, Vec<UnitName>)> {
        (
            prop::collection::vec((arb_unit_name(), 0u64..1000), 0..5),
            prop::collection::vec(arb_unit_name(), 0..5),
        )
    }
}

/// Build a relation snapshot with the given members, for scenario setup.
pub fn relation_with_members(life: Life, members: &[(&str, u64)]) -> RelationSnapshot {
    let mut rel = RelationSnapshot::new(life);
    for (unit, version) in members {
        rel.members.insert(UnitName::new(*unit), *version);
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_with_members_builds_expected_map() {
        let rel = relation_with_members(Life::Alive, &[("svc2/0", 7)]);
        assert_eq!(rel.members.get(&UnitName::new("svc2/0")), Some(&7));
    }
}
