//! Error types for workflow actions
//!
//! Covers:
//! - Local validation failures (no network call was made)
//! - Overlapping actions
//! - Backend failures, surfaced to the user as notifications

use rca_form::{EditorError, FormError};
use rca_remote::RemoteError;
use rca_schema::{ApplicationStatus, TransitionError, ValidationReport};

/// Errors raised by [`crate::ApplicationSession`] actions
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Another save or submit is still in flight
    #[error("another action is still in progress")]
    ActionPending,

    /// Submit requires a non-blank comment
    #[error("a submission comment is required")]
    CommentRequired,

    /// Form failed its schema; issues are attached to the controller
    #[error("form has {} validation issue(s)", .0.issues.len())]
    Invalid(ValidationReport),

    /// Action not allowed in the current status
    #[error("cannot {action} while {status}")]
    NotAllowed {
        action: &'static str,
        status: ApplicationStatus,
    },

    /// Status change rejected by the transition table
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Controller rejected a write
    #[error(transparent)]
    Form(#[from] FormError),

    /// Editor rejected a write
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// Backend call failed
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl WorkflowError {
    /// Failure detected locally, before any request was sent
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

/// Result alias for workflow actions
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors_are_not_local() {
        let err: WorkflowError = RemoteError::Unavailable("down".into()).into();
        assert!(!err.is_local());
        assert!(WorkflowError::CommentRequired.is_local());
    }

    #[test]
    fn not_allowed_display() {
        let err = WorkflowError::NotAllowed {
            action: "submit",
            status: ApplicationStatus::Approved,
        };
        assert_eq!(err.to_string(), "cannot submit while approved");
    }
}
