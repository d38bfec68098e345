//! Application status and the one-directional transition table

use crate::error::TransitionError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Review status of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Freely editable, not yet submitted
    #[default]
    Draft,
    /// Submitted for review
    Submitted,
    /// Picked up by a reviewer
    UnderReview,
    /// Reviewer asked for changes
    RevisionRequested,
    /// Approved
    Approved,
    /// Rejected
    Rejected,
}

impl ApplicationStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::RevisionRequested,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    /// Wire value
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::RevisionRequested => "revision_requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Every status other than draft renders the form read-only
    #[inline]
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        !matches!(self, Self::Draft)
    }

    /// No further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

impl Display for ApplicationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ApplicationStatus) -> &'static [ApplicationStatus] {
    use ApplicationStatus::*;
    match from {
        Draft => &[Submitted],
        Submitted => &[UnderReview],
        UnderReview => &[Approved, Rejected, RevisionRequested],
        RevisionRequested => &[Submitted],
        Approved | Rejected => &[],
    }
}

/// Validates a status transition.
///
/// # Errors
/// Returns [`TransitionError`] when `to` is not reachable from `from`.
pub fn validate_transition(
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Transitions the applicant-facing client may trigger itself.
///
/// Reviewer transitions exist in the table but are driven by separate tooling.
#[inline]
#[must_use]
pub fn is_client_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    matches!(
        (from, to),
        (ApplicationStatus::Draft, ApplicationStatus::Submitted)
    )
}
