//! SQLite persistence: pool, migrations and per-entity queries.

pub mod db;
pub mod exercises;
pub mod migrations;
pub mod sets;
pub mod workouts;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
