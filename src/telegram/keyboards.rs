//! Keyboards rendered by the bot.
//!
//! Every inline button carries an action token built with
//! [`ActionToken::encode`]; the reply keyboard carries the menu labels.

use strum::IntoEnumIterator;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::core::types::{
    category_label, EquipmentPreset, ExperienceLevel, Goal, WorkoutKind, WORKOUT_DURATIONS,
};
use crate::storage::exercises::Exercise;
use crate::storage::workouts::WorkoutSummary;
use crate::telegram::action::{ActionToken, Domain};
use crate::telegram::bot::MenuCommand;

const BACK: &str = "⬅️ Назад";

fn button<I, S>(label: impl Into<String>, domain: Domain, args: I) -> InlineKeyboardButton
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    InlineKeyboardButton::callback(label, ActionToken::encode(domain.key(), args))
}

fn back_to_settings() -> Vec<InlineKeyboardButton> {
    vec![button(BACK, Domain::Settings, ["main"])]
}

/// Persistent reply keyboard with the four menu entries.
pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(MenuCommand::CreateWorkout.as_ref()),
            KeyboardButton::new(MenuCommand::MyWorkouts.as_ref()),
        ],
        vec![
            KeyboardButton::new(MenuCommand::Exercises.as_ref()),
            KeyboardButton::new(MenuCommand::Settings.as_ref()),
        ],
    ])
}

pub fn workout_types() -> InlineKeyboardMarkup {
    let rows = WorkoutKind::iter()
        .map(|kind| {
            vec![button(
                format!("{} {}", kind.emoji(), kind.display_name()),
                Domain::WorkoutType,
                [kind.as_ref()],
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Duration choices for a workout type; the type travels in every button.
pub fn durations(workout_type: &str) -> InlineKeyboardMarkup {
    let choices = WORKOUT_DURATIONS
        .iter()
        .map(|minutes| {
            button(
                format!("⏱️ {} мин", minutes),
                Domain::Duration,
                [workout_type.to_string(), minutes.to_string()],
            )
        })
        .collect::<Vec<_>>();

    let mut rows: Vec<Vec<InlineKeyboardButton>> = choices.chunks(2).map(<[_]>::to_vec).collect();
    rows.push(vec![button(BACK, Domain::WorkoutType, ["main"])]);
    InlineKeyboardMarkup::new(rows)
}

pub fn settings() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🎯 Цели", Domain::Settings, ["goals"]),
            button("🏋️ Оборудование", Domain::Settings, ["equipment"]),
        ],
        vec![
            button("📈 Опыт", Domain::Settings, ["experience"]),
            button("⚠️ Ограничения", Domain::Settings, ["limitations"]),
        ],
    ])
}

pub fn goals() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Goal::iter()
        .map(|goal| vec![button(goal.label(), Domain::Goal, [goal.as_ref()])])
        .collect();
    rows.push(back_to_settings());
    InlineKeyboardMarkup::new(rows)
}

pub fn equipment() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = EquipmentPreset::iter()
        .map(|preset| vec![button(preset.label(), Domain::Equipment, [preset.as_ref()])])
        .collect();
    rows.push(back_to_settings());
    InlineKeyboardMarkup::new(rows)
}

/// Sub-menu behind `equipment:custom`.
pub fn equipment_custom() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(EquipmentPreset::Home.label(), Domain::Equipment, [EquipmentPreset::Home.as_ref()]),
            button(EquipmentPreset::Gym.label(), Domain::Equipment, [EquipmentPreset::Gym.as_ref()]),
        ],
        vec![button(BACK, Domain::Settings, ["equipment"])],
    ])
}

pub fn experience() -> InlineKeyboardMarkup {
    let levels = ExperienceLevel::iter()
        .map(|level| button(level.label(), Domain::Experience, [level.value()]))
        .collect::<Vec<_>>();
    let mut rows: Vec<Vec<InlineKeyboardButton>> = levels.chunks(2).map(<[_]>::to_vec).collect();
    rows.push(back_to_settings());
    InlineKeyboardMarkup::new(rows)
}

pub fn limitations() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_to_settings()])
}

/// Actions under an exercise card.
pub fn exercise(exercise: &Exercise) -> InlineKeyboardMarkup {
    let mut row = Vec::with_capacity(2);
    if exercise.video_path.as_deref().is_some_and(|p| !p.is_empty()) {
        row.push(button("📹 Видео", Domain::Exercise, ["video".to_string(), exercise.id.to_string()]));
    }
    row.push(button(
        "➕ В тренировку",
        Domain::Exercise,
        ["add".to_string(), exercise.id.to_string()],
    ));
    InlineKeyboardMarkup::new(vec![row])
}

pub fn exercise_categories(categories: &[&str]) -> InlineKeyboardMarkup {
    let buttons = categories
        .iter()
        .map(|category| button(category_label(category), Domain::Exercises, [category]))
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(buttons.chunks(2).map(<[_]>::to_vec).collect::<Vec<_>>())
}

pub fn exercise_list(exercises: &[Exercise]) -> InlineKeyboardMarkup {
    let rows = exercises
        .iter()
        .map(|e| {
            vec![button(
                format!("📖 {}", e.name),
                Domain::Exercise,
                ["details".to_string(), e.id.to_string()],
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Lets the user pick which of their workouts gets the exercise.
pub fn attach_targets(exercise_id: i64, workouts: &[WorkoutSummary]) -> InlineKeyboardMarkup {
    let rows = workouts
        .iter()
        .map(|summary| {
            vec![button(
                format!("{} {}", summary.workout.status.emoji(), summary.workout.name),
                Domain::Exercise,
                ["attach".to_string(), exercise_id.to_string(), summary.workout.id.to_string()],
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Per-workout controls plus list-wide actions.
pub fn workouts(list: &[WorkoutSummary]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = list
        .iter()
        .enumerate()
        .map(|(index, summary)| {
            let id = summary.workout.id.to_string();
            let n = index + 1;
            vec![
                button(format!("▶️ {}", n), Domain::Workout, ["start", id.as_str()]),
                button(format!("✏️ {}", n), Domain::Workout, ["edit", id.as_str()]),
                button(format!("🗑️ {}", n), Domain::Workout, ["delete", id.as_str()]),
            ]
        })
        .collect();
    rows.push(vec![
        button("🔄 Обновить", Domain::Workouts, ["refresh"]),
        button("📈 Статистика", Domain::Workouts, ["stats"]),
    ]);
    InlineKeyboardMarkup::new(rows)
}

pub fn workout_edit(workout_id: i64) -> InlineKeyboardMarkup {
    let id = workout_id.to_string();
    InlineKeyboardMarkup::new(vec![
        vec![
            button("▶️ Начать", Domain::Workout, ["start", id.as_str()]),
            button("🗑️ Удалить", Domain::Workout, ["delete", id.as_str()]),
        ],
        vec![button("💪 Добавить упражнения", Domain::Exercises, ["strength"])],
        vec![button(BACK, Domain::Workouts, ["refresh"])],
    ])
}

pub fn delete_confirmation(workout_id: i64) -> InlineKeyboardMarkup {
    let id = workout_id.to_string();
    InlineKeyboardMarkup::new(vec![vec![
        button("✅ Да, удалить", Domain::Confirm, ["delete_workout", id.as_str(), "yes"]),
        button("❌ Отмена", Domain::Confirm, ["delete_workout", id.as_str(), "no"]),
    ]])
}

/// Controls for one set of a workout exercise.
pub fn set_controls(workout_exercise_id: i64, set_number: i64) -> InlineKeyboardMarkup {
    let args = |action: &str| [action.to_string(), workout_exercise_id.to_string(), set_number.to_string()];
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ Подход выполнен", Domain::Set, args("complete"))],
        vec![
            button("⏭️ Пропустить", Domain::Set, args("skip")),
            button("⏸️ Пауза", Domain::Set, args("pause")),
        ],
    ])
}

pub fn finish_workout(workout_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "🏁 Завершить тренировку",
        Domain::Workout,
        ["finish".to_string(), workout_id.to_string()],
    )]])
}

#[cfg(test)]
pub(crate) fn payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
    use teloxide::types::InlineKeyboardButtonKind;

    markup
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|b| match &b.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}
