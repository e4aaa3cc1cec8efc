//! Shared types, config, and error definitions for the NDFD series pipeline.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::Error;
pub use traits::{DocumentFetcher, DocumentStore};
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
