//! Error types for form state

use rca_schema::{ApplicationStatus, Field, FieldError, RecordIssue};

/// Errors raised by the form controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Inputs are disabled outside of draft
    #[error("form is read-only while {status}")]
    ReadOnly { status: ApplicationStatus },

    /// A destructive-change prompt must be answered first
    #[error("confirmation pending for '{gate}'")]
    ConfirmationPending { gate: Field },

    /// `resolve_confirmation` called with no prompt open
    #[error("no confirmation pending")]
    NoPendingConfirmation,

    /// Typed field access failed
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Errors raised by sub-record editors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    /// Save or cancel with no dialog open
    #[error("editor is closed")]
    Closed,

    /// Index outside the record array
    #[error("record index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Buffer failed the required-field checklist
    #[error("invalid record: {0}")]
    Invalid(RecordIssue),

    /// The edited record moved or was removed since the dialog opened
    #[error("record at index {index} is no longer the one being edited")]
    Stale { index: usize },

    /// `confirm_delete` with no delete requested
    #[error("no delete pending")]
    NoPendingDelete,

    /// Commit through the controller failed
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Result alias for controller operations
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_display() {
        let err = FormError::ReadOnly {
            status: ApplicationStatus::Submitted,
        };
        assert_eq!(err.to_string(), "form is read-only while submitted");
    }

    #[test]
    fn editor_wraps_form_error() {
        let err: EditorError = FormError::NoPendingConfirmation.into();
        assert!(matches!(err, EditorError::Form(FormError::NoPendingConfirmation)));
    }
}
