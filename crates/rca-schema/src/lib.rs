//! RCA Schema Layer
//!
//! Typed model of research-compliance applications: IBC biosafety
//! applications, PMO research-activity plans and change requests.
//!
//! # Core Types
//!
//! - [`FormValues`] / [`Field`]: flat form record with typed accessors
//! - [`FieldPath`]: addresses a field, a record, or a record member
//! - [`GATES`]: gating booleans and the fields they control
//! - [`FormLayout`]: tab tree per form kind
//! - [`Schema`]: declarative validation rules per form kind
//!
//! # Example
//!
//! ```rust
//! use rca_schema::prelude::*;
//!
//! let mut values = FormValues::default();
//! Field::Title.set(&mut values, "Lentiviral vectors".into()).unwrap();
//!
//! let report = Schema::for_kind(ApplicationKind::Ibc)
//!     .validate(&values, ValidationMode::Submit)
//!     .unwrap_err();
//! assert!(report.issues_for(Field::ProjectSummary).next().is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod field;
pub mod gates;
pub mod layout;
pub mod model;
pub mod path;
pub mod record;
pub mod schema;
pub mod status;

pub use error::{FieldError, PathError, TransitionError};
pub use field::{Field, FieldKind, FieldValue, FormValues, Section};
pub use gates::{controlling_gate, gate_for, Gate, GATES};
pub use layout::{FormLayout, TabId, TabSpec};
pub use model::{
    sort_timeline, Application, ApplicationKind, ApplicationNumber, Comment, CommentKind,
    NewComment, PrincipalInvestigator, ResearchActivity, StaffMember,
};
pub use path::FieldPath;
pub use record::{
    CellLine, HazardousProcedure, RecordId, RecordIssue, SubRecord, SyntheticExperiment,
    TeamMember,
};
pub use schema::{FieldIssue, Schema, SchemaRule, ValidationMode, ValidationReport};
pub use status::{allowed_transitions, is_client_transition, validate_transition, ApplicationStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with compliance forms
    pub use crate::field::{Field, FieldValue, FormValues};
    pub use crate::model::{Application, ApplicationKind, Comment, NewComment};
    pub use crate::path::FieldPath;
    pub use crate::record::{CellLine, HazardousProcedure, RecordId, SubRecord, SyntheticExperiment, TeamMember};
    pub use crate::schema::{Schema, ValidationMode};
    pub use crate::status::ApplicationStatus;
}
