// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend error classification.
//!
//! Callers distinguish backend errors along exactly two predicates:
//! "not found" and "not found or unauthorized". Everything else is an
//! opaque transient failure that propagates unchanged.

use thiserror::Error;

/// An error returned by the backing store or a source watcher adapter.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    pub fn not_found(what: impl Into<String>) -> Self {
        BackendError::NotFound(what.into())
    }

    /// Whether this error represents the entity being gone — handled
    /// locally as a removal rather than a fatal error for relations and
    /// storage attachments.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }

    /// Whether this error should be translated into the terminal
    /// "agent should exit" sentinel when seen on the initial unit or
    /// service lookup.
    pub fn is_not_found_or_unauthorized(&self) -> bool {
        matches!(self, BackendError::NotFound(_) | BackendError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_found_or_unauthorized() {
        let err = BackendError::not_found("unit u/0");
        assert!(err.is_not_found());
        assert!(err.is_not_found_or_unauthorized());
    }

    #[test]
    fn unauthorized_is_not_found_or_unauthorized_but_not_not_found() {
        let err = BackendError::Unauthorized("unit u/0".into());
        assert!(!err.is_not_found());
        assert!(err.is_not_found_or_unauthorized());
    }

    #[test]
    fn other_is_neither() {
        let err = BackendError::Other("connection reset".into());
        assert!(!err.is_not_found());
        assert!(!err.is_not_found_or_unauthorized());
    }

    #[yare::parameterized(
        not_found =    { BackendError::not_found("x"),              true,  true },
        unauthorized = { BackendError::Unauthorized("x".into()),     false, true },
        other =        { BackendError::Other("x".into()),            false, false },
    )]
    fn classification_table(err: BackendError, not_found: bool, not_found_or_unauthorized: bool) {
        assert_eq!(err.is_not_found(), not_found);
        assert_eq!(err.is_not_found_or_unauthorized(), not_found_or_unauthorized);
    }
}
