//! Logged sets and the per-exercise weight history. Rows are only ever appended.

use rusqlite::{params, Connection};

use crate::core::error::AppResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SetRecord {
    pub id: i64,
    pub workout_exercise_id: i64,
    pub set_number: i64,
    pub weight_kg: f64,
    pub reps_done: i64,
    pub rest_taken_seconds: i64,
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub workout_exercise_id: i64,
    pub set_number: i64,
    pub weight_kg: f64,
    pub reps_done: i64,
    pub rest_taken_seconds: i64,
    /// Receipt time of the event that completed the set
    pub completed_at: String,
}

/// Appends a set row and returns its id.
pub fn record_set(conn: &Connection, set: &NewSet) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO sets (workout_exercise_id, set_number, weight_kg, reps_done, rest_taken_seconds, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            set.workout_exercise_id,
            set.set_number,
            set.weight_kg,
            set.reps_done,
            set.rest_taken_seconds,
            set.completed_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_sets(conn: &Connection, workout_exercise_id: i64) -> AppResult<Vec<SetRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, workout_exercise_id, set_number, weight_kg, reps_done, rest_taken_seconds, completed_at
         FROM sets WHERE workout_exercise_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![workout_exercise_id], |row| {
        Ok(SetRecord {
            id: row.get(0)?,
            workout_exercise_id: row.get(1)?,
            set_number: row.get(2)?,
            weight_kg: row.get(3)?,
            reps_done: row.get(4)?,
            rest_taken_seconds: row.get(5)?,
            completed_at: row.get(6)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// One point of a user's progress on an exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightEntry {
    pub id: i64,
    pub user_id: i64,
    pub exercise_id: i64,
    pub weight_kg: f64,
    pub reps_count: i64,
    pub recorded_at: String,
}

/// Appends a weight history point for the user owning the slot's workout.
pub fn record_weight_history(conn: &Connection, set: &NewSet) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO weight_history (user_id, exercise_id, weight_kg, reps_count, recorded_at)
         SELECT w.user_id, we.exercise_id, ?2, ?3, ?4
         FROM workout_exercises we JOIN workouts w ON w.id = we.workout_id
         WHERE we.id = ?1",
        params![set.workout_exercise_id, set.weight_kg, set.reps_done, set.completed_at],
    )?;
    if conn.changes() == 0 {
        return Err(format!("workout exercise {} not found", set.workout_exercise_id).into());
    }
    Ok(conn.last_insert_rowid())
}

/// Weight history of a user on one exercise, oldest first.
pub fn list_weight_history(conn: &Connection, user_id: i64, exercise_id: i64) -> AppResult<Vec<WeightEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, exercise_id, weight_kg, reps_count, recorded_at
         FROM weight_history WHERE user_id = ?1 AND exercise_id = ?2 ORDER BY recorded_at, id",
    )?;
    let rows = stmt.query_map(params![user_id, exercise_id], |row| {
        Ok(WeightEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            exercise_id: row.get(2)?,
            weight_kg: row.get(3)?,
            reps_count: row.get(4)?,
            recorded_at: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
