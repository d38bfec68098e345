//! Error types for the schema layer
//!
//! Covers:
//! - Typed field access (kind mismatches)
//! - Field path parsing
//! - Application status transitions
//! - Application number parsing

use crate::field::FieldKind;
use crate::status::ApplicationStatus;

/// Errors raised by typed field accessors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Value kind does not match the field's declared kind
    #[error("field '{field}' expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        field: &'static str,
        expected: FieldKind,
        actual: FieldKind,
    },

    /// Application number does not follow `<PREFIX>-<YEAR>-<SEQ>`
    #[error("invalid application number: {0}")]
    InvalidApplicationNumber(String),
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty path
    #[error("field path is empty")]
    Empty,

    /// First segment is not a known field
    #[error("unknown field in path: {0}")]
    UnknownField(String),

    /// Record index segment is not a number
    #[error("invalid record index: {0}")]
    InvalidIndex(String),

    /// Index or member given for a field that holds no records
    #[error("field '{0}' does not hold records")]
    NotARecordField(&'static str),

    /// Member segment has invalid characters
    #[error("invalid member segment: {0} (must be alphanumeric)")]
    InvalidMember(String),

    /// More than `field.index.member`
    #[error("too many segments in path: {0}")]
    TooManySegments(String),
}

/// Illegal status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal status transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current status
    pub from: ApplicationStatus,
    /// Requested status
    pub to: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_display() {
        let err = FieldError::TypeMismatch {
            field: "title",
            expected: FieldKind::Text,
            actual: FieldKind::Bool,
        };
        assert!(err.to_string().contains("'title'"));
    }

    #[test]
    fn transition_error_display() {
        let err = TransitionError {
            from: ApplicationStatus::Approved,
            to: ApplicationStatus::Draft,
        };
        assert_eq!(err.to_string(), "illegal status transition: approved -> draft");
    }
}
