//! Exercise catalogue queries.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::core::error::AppResult;
use crate::storage::db::json_column;

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// "strength", "cardio", "flexibility", "core"
    pub category: String,
    pub muscle_groups: Vec<String>,
    pub difficulty: i64,
    pub duration_minutes: i64,
    pub image_path: Option<String>,
    /// Object key (or absolute URL) of the demo video, if any
    pub video_path: Option<String>,
    pub equipment_ids: Vec<i64>,
}

impl Exercise {
    /// True if at least one of the given equipment ids lets the user do this exercise.
    pub fn fits_equipment(&self, available: &[i64]) -> bool {
        self.equipment_ids.iter().any(|id| available.contains(id))
    }
}

const EXERCISE_COLUMNS: &str =
    "id, name, description, category, muscle_groups, difficulty, duration_minutes, \
     image_path, video_path, equipment_ids";

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    let muscle_groups: String = row.get(4)?;
    let equipment_ids: String = row.get(9)?;

    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        muscle_groups: json_column(&muscle_groups, "exercises.muscle_groups"),
        difficulty: row.get(5)?,
        duration_minutes: row.get(6)?,
        image_path: row.get(7)?,
        video_path: row.get(8)?,
        equipment_ids: json_column(&equipment_ids, "exercises.equipment_ids"),
    })
}

pub fn get_exercise(conn: &Connection, id: i64) -> AppResult<Option<Exercise>> {
    let sql = format!("SELECT {} FROM exercises WHERE id = ?1", EXERCISE_COLUMNS);
    Ok(conn.query_row(&sql, params![id], exercise_from_row).optional()?)
}

/// All exercises ordered by category then name.
pub fn list_exercises(conn: &Connection) -> AppResult<Vec<Exercise>> {
    let sql = format!("SELECT {} FROM exercises ORDER BY category, name", EXERCISE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], exercise_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Exercises doable with the given equipment. An empty list means "no
/// preference yet" and returns the whole catalogue.
pub fn list_exercises_for_equipment(conn: &Connection, equipment_ids: &[i64]) -> AppResult<Vec<Exercise>> {
    let all = list_exercises(conn)?;
    if equipment_ids.is_empty() {
        return Ok(all);
    }
    Ok(all.into_iter().filter(|e| e.fits_equipment(equipment_ids)).collect())
}

pub fn list_exercises_by_category(conn: &Connection, category: &str) -> AppResult<Vec<Exercise>> {
    let sql = format!(
        "SELECT {} FROM exercises WHERE category = ?1 ORDER BY name",
        EXERCISE_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![category], exercise_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::get_connection;
    use crate::storage::db::test_support::temp_pool;

    #[test]
    fn test_seeded_catalogue_is_readable() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();

        let all = list_exercises(&conn).unwrap();
        assert!(!all.is_empty());

        let first = get_exercise(&conn, all[0].id).unwrap().unwrap();
        assert_eq!(first, all[0]);
        assert!(!first.muscle_groups.is_empty());
    }

    #[test]
    fn test_equipment_filter() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();

        let bodyweight = list_exercises_for_equipment(&conn, &[0]).unwrap();
        assert!(bodyweight.iter().all(|e| e.equipment_ids.contains(&0)));

        let everything = list_exercises_for_equipment(&conn, &[]).unwrap();
        assert!(everything.len() > bodyweight.len());
    }

    #[test]
    fn test_by_category_and_missing() {
        let (_dir, pool) = temp_pool();
        let conn = get_connection(&pool).unwrap();

        let cardio = list_exercises_by_category(&conn, "cardio").unwrap();
        assert!(!cardio.is_empty());
        assert!(cardio.iter().all(|e| e.category == "cardio"));

        assert!(list_exercises_by_category(&conn, "juggling").unwrap().is_empty());
        assert!(get_exercise(&conn, 999_999).unwrap().is_none());
    }
}
