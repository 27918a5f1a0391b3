use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use rusqlite::Connection;

use crate::core::error::AppResult;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies pending schema migrations and returns how many ran.
///
/// Runs are serialized per process; refinery wraps each migration in its own
/// transaction, so concurrent instances are kept apart by SQLite's lock.
pub fn run_migrations(conn: &mut Connection) -> AppResult<usize> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    conn.busy_timeout(Duration::from_secs(30))?;

    let report = embedded::migrations::runner().run(conn)?;
    let applied = report.applied_migrations().len();
    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();

        let first = run_migrations(&mut conn).unwrap();
        let second = run_migrations(&mut conn).unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);

        let exercises: i64 = conn
            .query_row("SELECT COUNT(*) FROM exercises", [], |r| r.get(0))
            .unwrap();
        assert!(exercises > 0);
    }
}
