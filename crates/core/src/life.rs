// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle state shared by units, relations, and storage attachments.

use serde::{Deserialize, Serialize};

/// Where an entity sits in its lifecycle, as reported by the backing store.
///
/// Every entity in this crate (units, relations, storage attachments)
/// shares the same three-stage lifecycle: it exists and is usable
/// (`Alive`), it is in the process of going away (`Dying`), or it is
/// gone but the record has not yet been reaped (`Dead`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Life {
    Alive,
    Dying,
    Dead,
}

impl Life {
    /// Whether the entity still has any remaining presence in the model.
    pub fn is_alive(&self) -> bool {
        matches!(self, Life::Alive)
    }
}

crate::simple_display! {
    Life {
        Alive => "alive",
        Dying => "dying",
        Dead => "dead",
    }
}

impl Default for Life {
    fn default() -> Self {
        Life::Alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_alive_only_for_alive_variant() {
        assert!(Life::Alive.is_alive());
        assert!(!Life::Dying.is_alive());
        assert!(!Life::Dead.is_alive());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Life::Dying).unwrap(), r#""dying""#);
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Life::Dead.to_string(), "dead");
    }
}
