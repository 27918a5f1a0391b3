//! Workouts bot - Telegram bot for planning workouts and tracking sets
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics and shared types
//! - `storage`: SQLite pool, migrations and queries
//! - `telegram`: events, conversation flows, dispatcher and transports

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{AppError, AppResult, Config};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
