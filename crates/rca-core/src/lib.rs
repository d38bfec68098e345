//! RCA Core - application sessions
//!
//! Ties the form controller to the backend:
//! - Loads applications through the query cache
//! - Saves drafts and submits for review
//! - Reports backend failures as notifications
//! - Loads configuration from TOML and `RCA_*` environment variables
//! - Installs the tracing subscriber
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = RcaConfig::from_env()?;
//! rca_core::telemetry::init(&config.telemetry);
//!
//! let session = ApplicationSession::connect(&config, Arc::new(TracingNotifier), "app-42").await?;
//! session.with_form(|form| form.set(Field::SubmissionComment, "Ready for review".into()))?;
//! let route = session.submit().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod notify;
pub mod telemetry;
pub mod workflow;

pub use config::{RcaConfig, TelemetryConfig};
pub use error::{WorkflowError, WorkflowResult};
pub use notify::{
    Notification, NotificationLevel, Notifier, QueuedNotifier, TracingNotifier, GENERIC_FAILURE,
};
pub use workflow::{ApplicationSession, Route};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving an application session
    pub use crate::{
        ApplicationSession, Notification, Notifier, RcaConfig, Route, TracingNotifier,
        WorkflowError,
    };
    pub use rca_form::{ConfirmChoice, FormController, SetOutcome, SubRecordEditor};
    pub use rca_schema::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
