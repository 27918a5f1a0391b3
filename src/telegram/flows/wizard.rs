//! Workout creation wizard: type → duration → workout.
//!
//! The chosen type rides inside the duration buttons, so the last step can
//! be pressed on its own (even from an old message) and still succeed.

use async_trait::async_trait;

use crate::core::types::WorkoutKind;
use crate::storage::db::ensure_user;
use crate::storage::workouts::{create_workout, set_workout_duration};
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::{button_press, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

pub const TYPE_MENU_TEXT: &str = "🏋️ Создание тренировки\n\nВыберите тип тренировки:";

/// Screen for a `workout_type` sub-action.
pub fn workout_type_screen(message_id: i32, sub_action: &str) -> Result<Reply, FlowError> {
    if sub_action == "main" {
        return Ok(Reply::edit(message_id, TYPE_MENU_TEXT, Some(keyboards::workout_types())));
    }

    let kind = sub_action
        .parse::<WorkoutKind>()
        .map_err(|_| FlowError::Invalid("Неизвестный тип тренировки"))?;
    let text = format!(
        "{} {}\n\nВыберите продолжительность тренировки:",
        kind.emoji(),
        kind.display_name()
    );
    Ok(Reply::edit(message_id, text, Some(keyboards::durations(kind.as_ref()))))
}

pub fn created_text(name: &str, minutes: u32) -> String {
    format!(
        "✅ Тренировка создана!\n\nТип: {}\nПродолжительность: {} минут\n\nТренировка добавлена в ваш список.",
        name, minutes
    )
}

/// `workout_type:<main|split|push_pull|fullbody|custom>`
pub struct WorkoutTypeHandler;

#[async_trait]
impl Handler for WorkoutTypeHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;
        workout_type_screen(press.message_id, token.arg(0)?)
    }
}

/// `duration:<type>:<minutes>`: creates the workout.
pub struct DurationHandler {
    deps: HandlerDeps,
}

impl DurationHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for DurationHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(3)?;

        let workout_type = token.arg(0)?;
        let minutes: u32 = token
            .parse_arg(1)
            .map_err(FlowError::invalid("Неверная продолжительность"))?;
        if minutes == 0 {
            return Err(FlowError::Invalid("Неверная продолжительность"));
        }

        let conn = self.deps.conn()?;
        let user = ensure_user(&conn, press.user_id).map_err(FlowError::storage("Ошибка при получении пользователя"))?;

        let name = WorkoutKind::name_for(workout_type);
        let workout = create_workout(&conn, user.id, name, workout_type)
            .map_err(FlowError::storage("Ошибка создания тренировки"))?;

        // A failed duration update keeps the column default.
        if let Err(e) = set_workout_duration(&conn, workout.id, i64::from(minutes)) {
            log::error!(
                "Failed to set duration {} for workout {} of user {}: {}",
                minutes,
                workout.id,
                press.user_id,
                e
            );
        }

        log::info!(
            "User {} created workout {} ({}, {} min)",
            press.user_id,
            workout.id,
            workout_type,
            minutes
        );
        Ok(Reply::edit(press.message_id, created_text(name, minutes), None))
    }
}
