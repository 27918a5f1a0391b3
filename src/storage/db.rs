use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::core::error::{AppError, AppResult};
use crate::storage::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Цель тренировок по умолчанию для нового пользователя
pub const DEFAULT_GOAL: &str = "muscle_gain";

/// Уровень опыта по умолчанию
pub const DEFAULT_EXPERIENCE: i64 = 1;

/// Пользователь бота.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Внутренний ID
    pub id: i64,
    /// Telegram ID пользователя
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Доступное оборудование (0 = без оборудования, 1 = дом, 2 = зал)
    pub equipment_ids: Vec<i64>,
    /// Цели тренировок: "muscle_gain", "strength", "endurance", "weight_loss"
    pub goals: Vec<String>,
    /// Уровень опыта
    pub experience: i64,
    /// Ограничения по здоровью
    pub limitations: Vec<String>,
}

/// Profile fields Telegram tells us about on `/start`.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Create a new database connection pool
///
/// Every pooled connection enforces foreign keys and waits on a locked
/// database instead of failing immediately. Schema migrations are applied
/// before the pool is returned.
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

/// Decodes a JSON array column, falling back to an empty value on garbage.
pub(crate) fn json_column<T: DeserializeOwned + Default>(raw: &str, column: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::warn!("Malformed JSON in column {}: {} ({})", column, raw, e);
        T::default()
    })
}

const USER_COLUMNS: &str =
    "id, telegram_id, username, first_name, last_name, equipment_ids, goals, experience, limitations";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let equipment_ids: String = row.get(5)?;
    let goals: String = row.get(6)?;
    let limitations: String = row.get(8)?;

    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        equipment_ids: json_column(&equipment_ids, "users.equipment_ids"),
        goals: json_column(&goals, "users.goals"),
        experience: row.get(7)?,
        limitations: json_column(&limitations, "users.limitations"),
    })
}

/// Looks a user up by Telegram ID.
pub fn get_user(conn: &Connection, telegram_id: i64) -> AppResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE telegram_id = ?1", USER_COLUMNS);
    let user = conn.query_row(&sql, params![telegram_id], user_from_row).optional()?;
    Ok(user)
}

/// Returns the user, creating a record with default settings on first contact.
pub fn ensure_user(conn: &Connection, telegram_id: i64) -> AppResult<User> {
    let default_goals = serde_json::to_string(&[DEFAULT_GOAL])?;
    conn.execute(
        "INSERT OR IGNORE INTO users (telegram_id, goals, experience) VALUES (?1, ?2, ?3)",
        params![telegram_id, default_goals, DEFAULT_EXPERIENCE],
    )?;

    get_user(conn, telegram_id)?.ok_or_else(|| AppError::Validation(format!("user {} vanished", telegram_id)))
}

/// Registers a user from `/start`, refreshing the Telegram profile of an
/// existing record without touching their training settings.
pub fn register_user(conn: &Connection, profile: &UserProfile) -> AppResult<User> {
    let default_goals = serde_json::to_string(&[DEFAULT_GOAL])?;
    conn.execute(
        "INSERT INTO users (telegram_id, username, first_name, last_name, goals, experience)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(telegram_id) DO UPDATE SET
            username = excluded.username,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            updated_at = CURRENT_TIMESTAMP",
        params![
            profile.telegram_id,
            profile.username,
            profile.first_name,
            profile.last_name,
            default_goals,
            DEFAULT_EXPERIENCE
        ],
    )?;

    get_user(conn, profile.telegram_id)?
        .ok_or_else(|| AppError::Validation(format!("user {} vanished", profile.telegram_id)))
}

/// Upserts the training settings of a user in a single statement.
pub fn save_user_settings(conn: &Connection, user: &User) -> AppResult<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, equipment_ids, goals, experience, limitations)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(telegram_id) DO UPDATE SET
            equipment_ids = excluded.equipment_ids,
            goals = excluded.goals,
            experience = excluded.experience,
            limitations = excluded.limitations,
            updated_at = CURRENT_TIMESTAMP",
        params![
            user.telegram_id,
            serde_json::to_string(&user.equipment_ids)?,
            serde_json::to_string(&user.goals)?,
            user.experience,
            serde_json::to_string(&user.limitations)?
        ],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// A migrated database in a temporary directory. Keep the guard alive.
    pub fn temp_pool() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }
}
