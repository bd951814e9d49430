//! Gatherly backend services
//!
//! Service layer of the Gatherly event platform: hosts create and manage
//! events, users discover and join them, payments reconcile into
//! participation state, and reviews are exchanged once events complete. A
//! background worker keeps stored lifecycle state converged with the clock.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{GatherlyError, Result};

// Re-export main components for easy access
pub use services::{LifecycleWorker, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
