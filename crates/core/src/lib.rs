// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rsw-core: shared domain types for the remote state watcher family.
//!
//! These types carry no dependency on a transport or a runtime: a
//! `Snapshot` is just data, produced by `rsw-watcher` and read by
//! whatever reconciliation loop embeds it.

pub mod macros;

pub mod ids;
pub mod life;
pub mod resolved_mode;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use ids::{RelationId, StorageTag, UnitName};
pub use life::Life;
pub use resolved_mode::ResolvedMode;
pub use snapshot::{RelationSnapshot, Snapshot, StorageAttachmentInfo, StorageSnapshot};
