//! fieldcase portal collaborators
//!
//! HTTP implementations of the document store and field catalog used by
//! the rewrite engine, against a portal's sharing REST API:
//!
//! - `generateToken` for credentialed access
//! - `content/items/{id}/data` to fetch a dashboard
//! - `content/items/{id}` plus `{service}/{layer}` to list a layer's fields
//! - `content/users/{owner}/items/{id}/update` to push the migrated dashboard
//!
//! [`CachedCatalog`] memoizes layer schemas for batch runs.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod response;

// Re-exports for convenience
pub use cache::{CacheStats, CachedCatalog};
pub use client::PortalClient;
pub use config::PortalConfig;
pub use error::{PortalError, PortalResult};
pub use response::ItemInfo;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
