//! RCA Remote Layer
//!
//! Backend access for compliance applications.
//!
//! # Components
//!
//! - [`ComplianceApi`]: async capability trait over the REST endpoints
//! - [`HttpComplianceClient`]: `reqwest` implementation with bearer auth
//! - [`QueryCache`] / [`MokaQueryCache`]: key-based read cache
//! - [`QueryClient`]: cached reads and invalidating writes
//!
//! # Architecture
//!
//! ```text
//! workflow → QueryClient ─┬→ QueryCache (moka)
//!                         └→ ComplianceApi → HTTP
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod query;

#[cfg(any(test, feature = "mock"))]
pub use api::MockComplianceApi;
pub use api::ComplianceApi;
pub use cache::{CacheStats, CachedValue, MokaQueryCache, QueryCache, QueryKey};
pub use client::HttpComplianceClient;
pub use config::{CacheConfig, ClientConfig};
pub use error::{RemoteError, RemoteResult};
pub use payload::ApplicationPayload;
pub use query::QueryClient;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
