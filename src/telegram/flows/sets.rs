//! Set tracking during an active workout.
//!
//! Progress is never stored as "current position": the next set number and
//! the next exercise slot are derived from the pressed token and the
//! workout plan, and only completed sets are written.

use async_trait::async_trait;
use strum::{AsRefStr, EnumString};

use crate::storage::sets::{record_set, record_weight_history, NewSet};
use crate::storage::workouts::{get_workout_exercise, list_workout_exercises, WorkoutExercise};
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::workout::{authorize, exercise_intro_text, load_workout};
use crate::telegram::flows::{button_press, db_timestamp, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SetAction {
    Complete,
    Skip,
    Pause,
}

/// What comes after a set of a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// Another set of the same slot
    Set(i64),
    /// First set of the following slot
    Exercise(WorkoutExercise),
    /// Nothing left, offer to finish the workout
    Finish,
}

pub fn next_step(plan: &[WorkoutExercise], current: &WorkoutExercise, set_number: i64) -> NextStep {
    if set_number < current.sets_count {
        return NextStep::Set(set_number + 1);
    }
    plan.iter()
        .position(|slot| slot.id == current.id)
        .and_then(|index| plan.get(index + 1))
        .map_or(NextStep::Finish, |next| NextStep::Exercise(next.clone()))
}

/// Screen that follows a completed or skipped set.
pub fn step_reply(
    message_id: i32,
    headline: &str,
    workout_id: i64,
    workout_name: &str,
    current: &WorkoutExercise,
    step: NextStep,
) -> Reply {
    match step {
        NextStep::Set(next) => Reply::edit(
            message_id,
            format!(
                "{}\n\n📖 {}\nСледующий подход: {} из {}\n⏱️ Отдых: {} сек",
                headline, current.exercise_name, next, current.sets_count, current.rest_seconds
            ),
            Some(keyboards::set_controls(current.id, next)),
        ),
        NextStep::Exercise(slot) => Reply::edit(
            message_id,
            format!("{}\n\n{}", headline, exercise_intro_text(workout_name, &slot)),
            Some(keyboards::set_controls(slot.id, 1)),
        ),
        NextStep::Finish => Reply::edit(
            message_id,
            format!("{}\n\n🎉 Все упражнения выполнены!", headline),
            Some(keyboards::finish_workout(workout_id)),
        ),
    }
}

/// `set:<complete|skip|pause>:<workoutExerciseId>:<setNumber>`
pub struct SetHandler {
    deps: HandlerDeps,
}

impl SetHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for SetHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(4)?;

        let action = token
            .arg(0)?
            .parse::<SetAction>()
            .map_err(|_| FlowError::Invalid("Неизвестное действие"))?;
        let slot_id: i64 = token
            .parse_arg(1)
            .map_err(FlowError::invalid("Неверный ID упражнения в тренировке"))?;
        let set_number: i64 = token
            .parse_arg(2)
            .map_err(FlowError::invalid("Неверный номер подхода"))?;

        let conn = self.deps.conn()?;
        let slot = get_workout_exercise(&conn, slot_id)
            .map_err(FlowError::storage("Ошибка загрузки упражнения"))?
            .ok_or_else(|| {
                log::error!("Workout exercise {} not found", slot_id);
                FlowError::NotFound("Упражнение в тренировке не найдено")
            })?;
        let workout = load_workout(&conn, slot.workout_id)?;
        authorize(&workout, press.user_id)?;

        let headline = match action {
            SetAction::Pause => {
                return Ok(Reply::edit(
                    press.message_id,
                    format!(
                        "⏸️ Тренировка приостановлена\n\n📖 {}, подход {} из {}\nНажмите, когда будете готовы продолжить.",
                        slot.exercise_name, set_number, slot.sets_count
                    ),
                    Some(keyboards::set_controls(slot.id, set_number)),
                ));
            }
            SetAction::Skip => "⏭️ Подход пропущен",
            SetAction::Complete => {
                let set = NewSet {
                    workout_exercise_id: slot.id,
                    set_number,
                    weight_kg: slot.weight_kg,
                    reps_done: slot.reps_count,
                    rest_taken_seconds: 0,
                    completed_at: db_timestamp(press.received_at),
                };
                let set_id = record_set(&conn, &set).map_err(FlowError::storage("Ошибка записи подхода"))?;
                if let Err(e) = record_weight_history(&conn, &set) {
                    log::error!("Failed to update weight history for slot {}: {}", slot.id, e);
                }
                log::info!(
                    "User {} completed set {} of slot {} (set row {})",
                    press.user_id,
                    set_number,
                    slot.id,
                    set_id
                );
                "✅ Подход завершен!"
            }
        };

        // The set row is committed here; a plan read failure only drops the keyboard.
        match list_workout_exercises(&conn, workout.id) {
            Ok(plan) => {
                let step = next_step(&plan, &slot, set_number);
                Ok(step_reply(press.message_id, headline, workout.id, &workout.name, &slot, step))
            }
            Err(e) => {
                log::error!("Failed to load plan of workout {}: {}", workout.id, e);
                Ok(Reply::text(headline))
            }
        }
    }
}
