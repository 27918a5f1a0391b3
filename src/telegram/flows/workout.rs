//! Workout lifecycle: list, start, edit, delete (with confirmation), finish.

use async_trait::async_trait;
use teloxide::types::InlineKeyboardMarkup;

use crate::storage::workouts::{
    complete_workout, count_workouts_by_status, delete_workout, get_workout, list_user_workouts,
    list_workout_exercises, start_workout, Workout, WorkoutExercise, WorkoutStatus, WorkoutSummary,
};
use crate::storage::DbConnection;
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::{button_press, db_timestamp, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

pub const EMPTY_WORKOUT_TEXT: &str = "В тренировке нет упражнений";
pub const EMPTY_LIST_TEXT: &str =
    "📊 У вас пока нет тренировок.\n\nНажмите «🏋️ Создать тренировку», чтобы добавить первую.";

/// Only the owner may see or change a workout.
pub fn authorize(workout: &Workout, requester: i64) -> Result<(), FlowError> {
    if workout.owner_telegram_id == requester {
        return Ok(());
    }
    log::warn!(
        "Access denied: user {} requested workout {} owned by {}",
        requester,
        workout.id,
        workout.owner_telegram_id
    );
    Err(FlowError::Forbidden {
        requester,
        owner: workout.owner_telegram_id,
        workout_id: workout.id,
    })
}

pub(crate) fn load_workout(conn: &DbConnection, workout_id: i64) -> Result<Workout, FlowError> {
    get_workout(conn, workout_id)
        .map_err(FlowError::storage("Ошибка загрузки тренировки"))?
        .ok_or_else(|| {
            log::error!("Workout {} not found", workout_id);
            FlowError::NotFound("Тренировка не найдена")
        })
}

/// Card for an exercise slot, shown before its first set.
pub fn exercise_intro_text(workout_name: &str, slot: &WorkoutExercise) -> String {
    format!(
        "🏋️ Тренировка: {}\n\n📖 Упражнение: {}\n📊 Подходы: {}\n🔄 Повторения: {}\n⏱️ Отдых: {} сек\n🏋️ Вес: {:.1} кг\n\nГотовы начать?",
        workout_name, slot.exercise_name, slot.sets_count, slot.reps_count, slot.rest_seconds, slot.weight_kg
    )
}

pub fn workout_list(workouts: &[WorkoutSummary]) -> (String, Option<InlineKeyboardMarkup>) {
    if workouts.is_empty() {
        return (EMPTY_LIST_TEXT.to_string(), None);
    }

    let mut text = String::from("📊 Ваши тренировки:\n");
    for (index, summary) in workouts.iter().enumerate() {
        let w = &summary.workout;
        text.push_str(&format!(
            "\n{}. {} {}\n   ⏱️ {} мин | 💪 {} упр. | {}\n",
            index + 1,
            w.status.emoji(),
            w.name,
            w.duration_minutes,
            summary.exercise_count,
            w.status.label()
        ));
    }
    (text, Some(keyboards::workouts(workouts)))
}

pub fn stats_text(counts: &[(WorkoutStatus, i64)]) -> String {
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    let count_of = |status: WorkoutStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    };
    format!(
        "📈 Статистика тренировок\n\nВсего: {}\n{} Запланировано: {}\n{} В процессе: {}\n{} Завершено: {}",
        total,
        WorkoutStatus::Planned.emoji(),
        count_of(WorkoutStatus::Planned),
        WorkoutStatus::InProgress.emoji(),
        count_of(WorkoutStatus::InProgress),
        WorkoutStatus::Completed.emoji(),
        count_of(WorkoutStatus::Completed)
    )
}

/// `workout:<start|edit|delete|finish>:<id>`
pub struct WorkoutHandler {
    deps: HandlerDeps,
}

impl WorkoutHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for WorkoutHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(3)?;

        let action = token.arg(0)?;
        if !matches!(action, "start" | "edit" | "delete" | "finish") {
            return Err(FlowError::Invalid("Неизвестное действие"));
        }
        let workout_id: i64 = token
            .parse_arg(1)
            .map_err(FlowError::invalid("Неверный ID тренировки"))?;

        let conn = self.deps.conn()?;
        let workout = load_workout(&conn, workout_id)?;
        authorize(&workout, press.user_id)?;

        match action {
            "start" => {
                start_workout(&conn, workout.id).map_err(FlowError::storage("Ошибка начала тренировки"))?;
                log::info!("User {} started workout {}", press.user_id, workout.id);

                let slots =
                    list_workout_exercises(&conn, workout.id).map_err(FlowError::storage("Ошибка начала тренировки"))?;
                let Some(first) = slots.first() else {
                    return Ok(Reply::text(format!("⚠️ {}", EMPTY_WORKOUT_TEXT)));
                };
                Ok(Reply::edit(
                    press.message_id,
                    exercise_intro_text(&workout.name, first),
                    Some(keyboards::set_controls(first.id, 1)),
                ))
            }
            "edit" => Ok(Reply::edit(
                press.message_id,
                format!("✏️ Редактирование тренировки: {}\n\nВыберите что изменить:", workout.name),
                Some(keyboards::workout_edit(workout.id)),
            )),
            "delete" => Ok(Reply::edit(
                press.message_id,
                format!("🗑️ Удалить тренировку «{}»?\n\nЭто действие нельзя отменить!", workout.name),
                Some(keyboards::delete_confirmation(workout.id)),
            )),
            _ => {
                if workout.status == WorkoutStatus::Completed {
                    return Ok(Reply::text("✅ Тренировка уже завершена"));
                }
                complete_workout(&conn, workout.id, &db_timestamp(press.received_at))
                    .map_err(FlowError::storage("Ошибка завершения тренировки"))?;
                log::info!("User {} finished workout {}", press.user_id, workout.id);
                Ok(Reply::edit(
                    press.message_id,
                    format!("🏁 Тренировка «{}» завершена!\n\nОтличная работа! 💪", workout.name),
                    None,
                ))
            }
        }
    }
}

/// `confirm:delete_workout:<id>:<yes|no>`
pub struct ConfirmHandler {
    deps: HandlerDeps,
}

impl ConfirmHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for ConfirmHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(4)?;

        if token.arg(0)? != "delete_workout" {
            return Err(FlowError::Invalid("Неизвестное действие"));
        }
        let workout_id: i64 = token
            .parse_arg(1)
            .map_err(FlowError::invalid("Неверный ID тренировки"))?;

        match token.arg(2)? {
            "yes" => {
                let conn = self.deps.conn()?;
                let workout = load_workout(&conn, workout_id)?;
                authorize(&workout, press.user_id)?;

                delete_workout(&conn, workout.id).map_err(FlowError::storage("Ошибка удаления тренировки"))?;
                log::info!("User {} deleted workout {}", press.user_id, workout.id);
                Ok(Reply::edit(
                    press.message_id,
                    format!("🗑️ Тренировка «{}» удалена", workout.name),
                    None,
                ))
            }
            "no" => Ok(Reply::edit(press.message_id, "↩️ Удаление отменено", None)),
            _ => Err(FlowError::Invalid("Неизвестное действие")),
        }
    }
}

/// `workouts:<refresh|stats>`
pub struct WorkoutListHandler {
    deps: HandlerDeps,
}

impl WorkoutListHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for WorkoutListHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;

        let conn = self.deps.conn()?;
        match token.arg(0)? {
            "refresh" => {
                let workouts = list_user_workouts(&conn, press.user_id)
                    .map_err(FlowError::storage("Ошибка получения тренировок"))?;
                let (text, markup) = workout_list(&workouts);
                Ok(Reply::edit(press.message_id, text, markup))
            }
            "stats" => {
                let counts = count_workouts_by_status(&conn, press.user_id)
                    .map_err(FlowError::storage("Ошибка получения статистики"))?;
                Ok(Reply::text(stats_text(&counts)))
            }
            _ => Err(FlowError::Invalid("Неизвестное действие")),
        }
    }
}
