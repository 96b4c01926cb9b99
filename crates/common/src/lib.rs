//! PaperScout Common Library
//!
//! Shared code for the PaperScout scoring engine including:
//! - Database models and repository patterns
//! - Judgment client abstraction
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod judgment;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, PaperStore, Repository};
pub use errors::{AppError, Result};
pub use judgment::{Judge, Judgment};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
