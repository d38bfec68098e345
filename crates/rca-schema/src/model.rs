//! Application, comment and reference-data records

use crate::error::FieldError;
use crate::field::FormValues;
use crate::status::ApplicationStatus;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Form variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationKind {
    /// Institutional Biosafety Committee application
    #[default]
    Ibc,
    /// PMO research-activity plan
    Pmo,
    /// Change request against an approved application
    ChangeRequest,
}

impl ApplicationKind {
    /// Application number prefix
    #[must_use]
    pub const fn number_prefix(self) -> &'static str {
        match self {
            Self::Ibc => "IBC",
            Self::Pmo => "PMO",
            Self::ChangeRequest => "CR",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "IBC" => Some(Self::Ibc),
            "PMO" => Some(Self::Pmo),
            "CR" => Some(Self::ChangeRequest),
            _ => None,
        }
    }
}

static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(IBC|PMO|CR)-(\d{4})-(\d{4,})$").expect("application number pattern is valid")
});

/// Server-generated application number, e.g. `IBC-2026-0042`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationNumber {
    kind: ApplicationKind,
    year: u16,
    sequence: u32,
}

impl ApplicationNumber {
    /// Form variant encoded in the prefix
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ApplicationKind {
        self.kind
    }

    /// Year of creation
    #[inline]
    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Sequence within the year
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl FromStr for ApplicationNumber {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FieldError::InvalidApplicationNumber(s.to_string());
        let caps = NUMBER_PATTERN.captures(s).ok_or_else(invalid)?;
        let kind = ApplicationKind::from_prefix(&caps[1]).ok_or_else(invalid)?;
        let year = caps[2].parse().map_err(|_| invalid())?;
        let sequence = caps[3].parse().map_err(|_| invalid())?;
        Ok(Self {
            kind,
            year,
            sequence,
        })
    }
}

impl TryFrom<String> for ApplicationNumber {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationNumber> for String {
    fn from(number: ApplicationNumber) -> Self {
        number.to_string()
    }
}

impl Display for ApplicationNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:04}-{:04}",
            self.kind.number_prefix(),
            self.year,
            self.sequence
        )
    }
}

/// Compliance application as exchanged with the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Server id; empty until the application has been created
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<ApplicationNumber>,
    #[serde(default)]
    pub kind: ApplicationKind,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Form body, flattened into the same JSON object
    #[serde(flatten)]
    pub form: FormValues,
}

impl Application {
    /// Unsaved draft of the given kind
    #[must_use]
    pub fn new_draft(kind: ApplicationKind) -> Self {
        Self {
            id: String::new(),
            number: None,
            kind,
            status: ApplicationStatus::Draft,
            created_at: None,
            updated_at: None,
            form: FormValues::default(),
        }
    }

    /// True once the backend has assigned an id
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Inputs are disabled outside of draft
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.status.is_read_only()
    }
}

/// Kind of timeline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// Entered by the applicant on submit
    Submission,
    /// Reviewer feedback
    Reviewer,
    /// Request for revision
    Revision,
    #[default]
    General,
}

/// Immutable timeline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub application_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub kind: CommentKind,
}

/// Comment to be appended to a timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    pub kind: CommentKind,
}

impl NewComment {
    /// Submission comment
    #[inline]
    pub fn submission(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CommentKind::Submission,
        }
    }
}

/// Order a timeline oldest-first; ties keep their server order
pub fn sort_timeline(comments: &mut [Comment]) {
    comments.sort_by_key(|c| c.created_at);
}

/// Principal investigator available for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalInvestigator {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
}

/// Research activity owned by a principal investigator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchActivity {
    pub id: String,
    pub title: String,
    pub principal_investigator_id: String,
}

/// Staff member attached to a research activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
}
