//! Workouts and the exercises planned inside them.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use strum::{AsRefStr, Display, EnumString};

use crate::core::error::AppResult;

/// Lifecycle of a workout: planned → in_progress → completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum WorkoutStatus {
    Planned,
    InProgress,
    Completed,
}

impl WorkoutStatus {
    pub fn emoji(self) -> &'static str {
        match self {
            WorkoutStatus::Planned => "📋",
            WorkoutStatus::InProgress => "🏃",
            WorkoutStatus::Completed => "✅",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkoutStatus::Planned => "Запланирована",
            WorkoutStatus::InProgress => "В процессе",
            WorkoutStatus::Completed => "Завершена",
        }
    }
}

impl FromSql for WorkoutStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for WorkoutStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_ref()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: i64,
    /// Internal id of the owning user
    pub user_id: i64,
    /// Telegram id of the owning user, used for ownership checks
    pub owner_telegram_id: i64,
    pub name: String,
    pub duration_minutes: i64,
    pub status: WorkoutStatus,
    pub workout_type: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// A workout together with the number of exercises planned in it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSummary {
    pub workout: Workout,
    pub exercise_count: i64,
}

/// An exercise slot inside a workout.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub order_index: i64,
    pub sets_count: i64,
    pub reps_count: i64,
    pub rest_seconds: i64,
    pub weight_kg: f64,
}

/// Parameters of a new exercise slot.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutExercise {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub sets_count: i64,
    pub reps_count: i64,
    pub rest_seconds: i64,
    pub weight_kg: f64,
}

impl NewWorkoutExercise {
    /// 3 sets of 10 with 90 seconds of rest, bodyweight.
    pub fn with_defaults(workout_id: i64, exercise_id: i64) -> Self {
        Self {
            workout_id,
            exercise_id,
            sets_count: 3,
            reps_count: 10,
            rest_seconds: 90,
            weight_kg: 0.0,
        }
    }
}

const WORKOUT_SELECT: &str = "SELECT w.id, w.user_id, u.telegram_id, w.name, w.duration_minutes, w.status, \
     w.workout_type, w.created_at, w.completed_at \
     FROM workouts w JOIN users u ON u.id = w.user_id";

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        id: row.get(0)?,
        user_id: row.get(1)?,
        owner_telegram_id: row.get(2)?,
        name: row.get(3)?,
        duration_minutes: row.get(4)?,
        status: row.get(5)?,
        workout_type: row.get(6)?,
        created_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

const WORKOUT_EXERCISE_SELECT: &str = "SELECT we.id, we.workout_id, we.exercise_id, e.name, we.order_index, \
     we.sets_count, we.reps_count, we.rest_seconds, we.weight_kg \
     FROM workout_exercises we JOIN exercises e ON e.id = we.exercise_id";

fn workout_exercise_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutExercise> {
    Ok(WorkoutExercise {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        exercise_name: row.get(3)?,
        order_index: row.get(4)?,
        sets_count: row.get(5)?,
        reps_count: row.get(6)?,
        rest_seconds: row.get(7)?,
        weight_kg: row.get(8)?,
    })
}

/// Creates a planned workout with the default duration and returns it.
pub fn create_workout(conn: &Connection, user_id: i64, name: &str, workout_type: &str) -> AppResult<Workout> {
    conn.execute(
        "INSERT INTO workouts (user_id, name, workout_type, status) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, workout_type, WorkoutStatus::Planned],
    )?;
    let id = conn.last_insert_rowid();

    let sql = format!("{} WHERE w.id = ?1", WORKOUT_SELECT);
    Ok(conn.query_row(&sql, params![id], workout_from_row)?)
}

pub fn set_workout_duration(conn: &Connection, workout_id: i64, minutes: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE workouts SET duration_minutes = ?1 WHERE id = ?2",
        params![minutes, workout_id],
    )?;
    Ok(())
}

pub fn get_workout(conn: &Connection, workout_id: i64) -> AppResult<Option<Workout>> {
    let sql = format!("{} WHERE w.id = ?1", WORKOUT_SELECT);
    Ok(conn.query_row(&sql, params![workout_id], workout_from_row).optional()?)
}

/// Workouts of a user, newest first, with their exercise counts.
pub fn list_user_workouts(conn: &Connection, telegram_id: i64) -> AppResult<Vec<WorkoutSummary>> {
    let mut stmt = conn.prepare(
        "SELECT w.id, w.user_id, u.telegram_id, w.name, w.duration_minutes, w.status, \
         w.workout_type, w.created_at, w.completed_at, \
         (SELECT COUNT(*) FROM workout_exercises we WHERE we.workout_id = w.id) \
         FROM workouts w JOIN users u ON u.id = w.user_id \
         WHERE u.telegram_id = ?1 ORDER BY w.created_at DESC, w.id DESC",
    )?;
    let rows = stmt.query_map(params![telegram_id], |row| {
        Ok(WorkoutSummary {
            workout: workout_from_row(row)?,
            exercise_count: row.get(9)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Number of workouts of a user per status.
pub fn count_workouts_by_status(conn: &Connection, telegram_id: i64) -> AppResult<Vec<(WorkoutStatus, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT w.status, COUNT(*) FROM workouts w JOIN users u ON u.id = w.user_id \
         WHERE u.telegram_id = ?1 GROUP BY w.status ORDER BY w.status",
    )?;
    let rows = stmt.query_map(params![telegram_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Moves a workout to `in_progress`.
pub fn start_workout(conn: &Connection, workout_id: i64) -> AppResult<()> {
    conn.execute(
        "UPDATE workouts SET status = ?1 WHERE id = ?2",
        params![WorkoutStatus::InProgress, workout_id],
    )?;
    Ok(())
}

/// Moves a workout to `completed` and stamps the completion time.
pub fn complete_workout(conn: &Connection, workout_id: i64, completed_at: &str) -> AppResult<()> {
    conn.execute(
        "UPDATE workouts SET status = ?1, completed_at = ?2 WHERE id = ?3",
        params![WorkoutStatus::Completed, completed_at, workout_id],
    )?;
    Ok(())
}

/// Deletes a workout; its exercise slots and logged sets go with it.
pub fn delete_workout(conn: &Connection, workout_id: i64) -> AppResult<bool> {
    let deleted = conn.execute("DELETE FROM workouts WHERE id = ?1", params![workout_id])?;
    Ok(deleted > 0)
}

/// Exercise slots of a workout in execution order.
pub fn list_workout_exercises(conn: &Connection, workout_id: i64) -> AppResult<Vec<WorkoutExercise>> {
    let sql = format!(
        "{} WHERE we.workout_id = ?1 ORDER BY we.order_index, we.id",
        WORKOUT_EXERCISE_SELECT
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![workout_id], workout_exercise_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_workout_exercise(conn: &Connection, id: i64) -> AppResult<Option<WorkoutExercise>> {
    let sql = format!("{} WHERE we.id = ?1", WORKOUT_EXERCISE_SELECT);
    Ok(conn.query_row(&sql, params![id], workout_exercise_from_row).optional()?)
}

/// Appends an exercise at the end of a workout and returns the new slot.
pub fn add_exercise_to_workout(conn: &Connection, new: &NewWorkoutExercise) -> AppResult<WorkoutExercise> {
    conn.execute(
        "INSERT INTO workout_exercises \
         (workout_id, exercise_id, order_index, sets_count, reps_count, rest_seconds, weight_kg) \
         VALUES (?1, ?2, (SELECT COALESCE(MAX(order_index) + 1, 0) FROM workout_exercises WHERE workout_id = ?1), \
                 ?3, ?4, ?5, ?6)",
        params![
            new.workout_id,
            new.exercise_id,
            new.sets_count,
            new.reps_count,
            new.rest_seconds,
            new.weight_kg
        ],
    )?;
    let id = conn.last_insert_rowid();

    let sql = format!("{} WHERE we.id = ?1", WORKOUT_EXERCISE_SELECT);
    Ok(conn.query_row(&sql, params![id], workout_exercise_from_row)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::test_support::temp_pool;
    use crate::storage::db::{ensure_user, get_connection};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_round_trips_through_sql() {
        assert_eq!(WorkoutStatus::InProgress.to_string(), "in_progress");
        assert_eq!("completed".parse::<WorkoutStatus>().unwrap(), WorkoutStatus::Completed);
        assert!("paused".parse::<WorkoutStatus>().is_err());
    }

    #[test]
    fn test_create_and_list() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();
        let user = ensure_user(&conn, 55).unwrap();

        let first = create_workout(&conn, user.id, "Фулбади", "fullbody").unwrap();
        let second = create_workout(&conn, user.id, "Push/Pull/Legs", "push_pull").unwrap();
        set_workout_duration(&conn, second.id, 45).unwrap();

        assert_eq!(first.status, WorkoutStatus::Planned);
        assert_eq!(first.duration_minutes, 0);
        assert_eq!(first.owner_telegram_id, 55);

        let list = list_user_workouts(&conn, 55).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].workout.id, second.id);
        assert_eq!(list[0].workout.duration_minutes, 45);
        assert_eq!(list[0].exercise_count, 0);

        assert!(list_user_workouts(&conn, 56).unwrap().is_empty());
    }

    #[test]
    fn test_exercises_are_appended_in_order() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();
        let user = ensure_user(&conn, 9).unwrap();
        let workout = create_workout(&conn, user.id, "Классический сплит", "split").unwrap();

        let a = add_exercise_to_workout(&conn, &NewWorkoutExercise::with_defaults(workout.id, 1)).unwrap();
        let b = add_exercise_to_workout(&conn, &NewWorkoutExercise::with_defaults(workout.id, 2)).unwrap();

        assert_eq!(a.order_index, 0);
        assert_eq!(b.order_index, 1);
        assert_eq!(a.sets_count, 3);

        let slots = list_workout_exercises(&conn, workout.id).unwrap();
        assert_eq!(slots.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(get_workout_exercise(&conn, b.id).unwrap().unwrap(), b);
    }

    #[test]
    fn test_lifecycle_and_delete() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();
        let user = ensure_user(&conn, 10).unwrap();
        let workout = create_workout(&conn, user.id, "Фулбади", "fullbody").unwrap();
        add_exercise_to_workout(&conn, &NewWorkoutExercise::with_defaults(workout.id, 1)).unwrap();

        start_workout(&conn, workout.id).unwrap();
        assert_eq!(
            get_workout(&conn, workout.id).unwrap().unwrap().status,
            WorkoutStatus::InProgress
        );

        complete_workout(&conn, workout.id, "2026-01-01 10:00:00").unwrap();
        let done = get_workout(&conn, workout.id).unwrap().unwrap();
        assert_eq!(done.status, WorkoutStatus::Completed);
        assert_eq!(done.completed_at.as_deref(), Some("2026-01-01 10:00:00"));

        let counts = count_workouts_by_status(&conn, 10).unwrap();
        assert_eq!(counts, vec![(WorkoutStatus::Completed, 1)]);

        assert!(delete_workout(&conn, workout.id).unwrap());
        assert!(get_workout(&conn, workout.id).unwrap().is_none());
        assert!(list_workout_exercises(&conn, workout.id).unwrap().is_empty());
        assert!(!delete_workout(&conn, workout.id).unwrap());
    }
}
