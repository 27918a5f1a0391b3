//! Shared infrastructure: configuration, errors, logging, metrics and media links.

pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod metrics;
pub mod types;

pub use config::{Config, TransportMode};
pub use error::{AppError, AppResult};
pub use metrics::Metrics;
