// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit's resolved-error mode, cleared out-of-band by an operator action.

use serde::{Deserialize, Serialize};

/// How a unit should proceed past a hook error, set externally and
/// cleared by [`crate::snapshot::Snapshot`]'s owner via
/// `ClearResolvedMode` once handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedMode {
    None,
    RetryHooks,
    NoHooks,
}

crate::simple_display! {
    ResolvedMode {
        None => "none",
        RetryHooks => "retry-hooks",
        NoHooks => "no-hooks",
    }
}

impl Default for ResolvedMode {
    fn default() -> Self {
        ResolvedMode::None
    }
}
