//! Exercise catalogue browsing and adding exercises to workouts.

use async_trait::async_trait;

use crate::core::types::category_label;
use crate::storage::exercises::{get_exercise, list_exercises_by_category, Exercise};
use crate::storage::workouts::{add_exercise_to_workout, list_user_workouts, NewWorkoutExercise};
use crate::storage::DbConnection;
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::workout::{authorize, load_workout};
use crate::telegram::flows::{button_press, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

pub const NO_WORKOUTS_TEXT: &str = "У вас нет тренировок. Создайте тренировку сначала.";

pub fn details_text(exercise: &Exercise) -> String {
    let mut text = format!("📖 {}\n\n{}", exercise.name, exercise.description);
    if !exercise.muscle_groups.is_empty() {
        text.push_str(&format!("\n\n💪 Группы мышц: {}", exercise.muscle_groups.join(", ")));
    }
    text.push_str(&format!("\n📊 Сложность: {}/5", exercise.difficulty));
    text
}

fn load_exercise(conn: &DbConnection, id: i64) -> Result<Exercise, FlowError> {
    get_exercise(conn, id)
        .map_err(FlowError::storage("Ошибка загрузки упражнения"))?
        .ok_or_else(|| {
            log::error!("Exercise {} not found", id);
            FlowError::NotFound("Упражнение не найдено")
        })
}

/// `exercise:<details|video|add>:<id>` and `exercise:attach:<id>:<workoutId>`
pub struct ExerciseHandler {
    deps: HandlerDeps,
}

impl ExerciseHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for ExerciseHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(3)?;

        let action = token.arg(0)?;
        let exercise_id: i64 = token
            .parse_arg(1)
            .map_err(FlowError::invalid("Неверный ID упражнения"))?;

        match action {
            "details" => {
                let conn = self.deps.conn()?;
                let exercise = load_exercise(&conn, exercise_id)?;
                Ok(Reply::with_keyboard(details_text(&exercise), keyboards::exercise(&exercise)))
            }
            "video" => {
                let conn = self.deps.conn()?;
                let exercise = load_exercise(&conn, exercise_id)?;
                let url = exercise
                    .video_path
                    .as_deref()
                    .and_then(|path| self.deps.media.resolve(path))
                    .ok_or_else(|| {
                        log::error!("No playable video for exercise {}", exercise_id);
                        FlowError::NotFound("Видео для этого упражнения не найдено")
                    })?;
                Ok(Reply::Video {
                    url,
                    caption: format!("📹 {}", exercise.name),
                })
            }
            "add" => {
                let conn = self.deps.conn()?;
                let exercise = load_exercise(&conn, exercise_id)?;
                let workouts = list_user_workouts(&conn, press.user_id)
                    .map_err(FlowError::storage("Ошибка получения тренировок"))?;
                if workouts.is_empty() {
                    return Ok(Reply::text(NO_WORKOUTS_TEXT));
                }
                Ok(Reply::with_keyboard(
                    format!("➕ {}\n\nВыберите тренировку:", exercise.name),
                    keyboards::attach_targets(exercise.id, &workouts),
                ))
            }
            "attach" => {
                token.require(4)?;
                let workout_id: i64 = token
                    .parse_arg(2)
                    .map_err(FlowError::invalid("Неверный ID тренировки"))?;

                let conn = self.deps.conn()?;
                let workout = load_workout(&conn, workout_id)?;
                authorize(&workout, press.user_id)?;

                let exercise = load_exercise(&conn, exercise_id)?;
                let slot = add_exercise_to_workout(&conn, &NewWorkoutExercise::with_defaults(workout.id, exercise.id))
                    .map_err(FlowError::storage("Ошибка добавления упражнения"))?;

                log::info!(
                    "User {} added exercise {} to workout {} as slot {}",
                    press.user_id,
                    exercise.id,
                    workout.id,
                    slot.id
                );
                Ok(Reply::edit(
                    press.message_id,
                    format!(
                        "✅ «{}» добавлено в тренировку «{}»\n\n📊 Подходы: {}\n🔄 Повторения: {}",
                        exercise.name, workout.name, slot.sets_count, slot.reps_count
                    ),
                    None,
                ))
            }
            _ => Err(FlowError::Invalid("Неизвестное действие")),
        }
    }
}

/// `exercises:<category>`
pub struct CategoryHandler {
    deps: HandlerDeps,
}

impl CategoryHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for CategoryHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (_, token) = button_press(event)?;
        token.require(2)?;
        let category = token.arg(0)?;

        let conn = self.deps.conn()?;
        let exercises =
            list_exercises_by_category(&conn, category).map_err(FlowError::storage("Ошибка получения упражнений"))?;
        if exercises.is_empty() {
            return Ok(Reply::text(format!(
                "{}\n\nВ этой категории пока нет упражнений.",
                category_label(category)
            )));
        }

        let mut text = format!("{}\n", category_label(category));
        for exercise in &exercises {
            text.push_str(&format!("\n• {}", exercise.name));
        }
        Ok(Reply::with_keyboard(text, keyboards::exercise_list(&exercises)))
    }
}
