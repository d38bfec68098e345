//! RCA Form Layer
//!
//! Headless state for one open compliance form.
//!
//! # Components
//!
//! - [`FormController`]: values, dirty/touched tracking, inline errors, watchers
//! - [`DestructiveChangeGuard`]: holds back gate changes that would discard data
//! - [`Visibility`]: which tabs are shown for the current values
//! - [`SubRecordEditor`]: create/edit/delete dialogs for array fields
//!
//! # Example
//!
//! ```rust
//! use rca_form::prelude::*;
//! use rca_schema::{ApplicationKind, ApplicationStatus, Field};
//!
//! let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
//! form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
//! form.set(Field::HumanMaterialsDescription, "Primary PBMCs".into()).unwrap();
//!
//! let outcome = form.set(Field::HumanNonHumanPrimateMaterial, false.into()).unwrap();
//! assert!(matches!(outcome, SetOutcome::ConfirmationRequired(_)));
//! form.resolve_confirmation(ConfirmChoice::DeleteData).unwrap();
//! assert!(form.values().human_materials_description.is_empty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod controller;
pub mod editor;
pub mod error;
pub mod guard;
pub mod visibility;

pub use controller::{FieldChange, FormController, SetOutcome, WatchId, WatchTarget};
pub use editor::{EditorMode, SavedRecord, SubRecordEditor};
pub use error::{EditorError, FormError, FormResult};
pub use guard::{ConfirmChoice, ConfirmationPrompt, DestructiveChangeGuard, GuardDecision};
pub use visibility::Visibility;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a form
    pub use crate::controller::{FieldChange, FormController, SetOutcome, WatchTarget};
    pub use crate::editor::SubRecordEditor;
    pub use crate::error::{EditorError, FormError};
    pub use crate::guard::{ConfirmChoice, ConfirmationPrompt};
    pub use crate::visibility::Visibility;
}
