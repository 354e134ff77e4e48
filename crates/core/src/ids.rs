// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes used as `Snapshot` map keys.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Integer identifier for a relation, as assigned by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationId(pub u64);

impl RelationId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RelationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque storage attachment identifier, as reported by the backing store.
///
/// Treated as an opaque string: callers must not assume any internal
/// structure beyond stable equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageTag(pub String);

impl StorageTag {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StorageTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StorageTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for StorageTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Name of a peer unit participating in a relation (e.g. `"svc2/0"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitName(pub String);

impl UnitName {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UnitName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UnitName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for UnitName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
