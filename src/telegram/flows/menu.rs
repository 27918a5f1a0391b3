//! Main menu commands.

use std::collections::BTreeMap;

use async_trait::async_trait;
use indoc::indoc;

use crate::core::types::{category_label, equipment_label, ExperienceLevel, Goal, EXERCISE_CATEGORIES};
use crate::storage::db::{ensure_user, register_user, User, UserProfile};
use crate::storage::exercises::{list_exercises_for_equipment, Exercise};
use crate::storage::workouts::list_user_workouts;
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::settings::SETTINGS_MENU_TEXT;
use crate::telegram::flows::wizard::TYPE_MENU_TEXT;
use crate::telegram::flows::workout::workout_list;
use crate::telegram::flows::{command, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

pub const WELCOME_TEXT: &str = indoc! {"
    Привет! Я бот для тренировок 🏋️

    Я помогу тебе:
    • составить тренировку под твой уровень и цели
    • подобрать упражнения под доступное оборудование
    • отслеживать подходы прямо во время тренировки

    Выбери действие в меню ниже 👇"};

/// How many exercises of each category the overview lists.
const EXERCISES_PER_CATEGORY: usize = 5;

/// `/start`: registers the user and shows the menu keyboard.
pub struct StartCommand {
    deps: HandlerDeps,
}

impl StartCommand {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for StartCommand {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let cmd = command(event)?;
        let profile = UserProfile {
            telegram_id: cmd.user_id,
            username: cmd.username.clone(),
            first_name: cmd.first_name.clone(),
            last_name: cmd.last_name.clone(),
        };

        let conn = self.deps.conn()?;
        let user = register_user(&conn, &profile).map_err(FlowError::storage("Ошибка регистрации"))?;
        log::info!("User {} registered (id {})", user.telegram_id, user.id);

        Ok(Reply::with_keyboard(WELCOME_TEXT, keyboards::main_menu()))
    }
}

pub struct CreateWorkoutCommand;

#[async_trait]
impl Handler for CreateWorkoutCommand {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        command(event)?;
        Ok(Reply::with_keyboard(TYPE_MENU_TEXT, keyboards::workout_types()))
    }
}

pub struct MyWorkoutsCommand {
    deps: HandlerDeps,
}

impl MyWorkoutsCommand {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for MyWorkoutsCommand {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let cmd = command(event)?;
        let conn = self.deps.conn()?;
        let workouts =
            list_user_workouts(&conn, cmd.user_id).map_err(FlowError::storage("Ошибка получения тренировок"))?;

        let (text, markup) = workout_list(&workouts);
        Ok(match markup {
            Some(markup) => Reply::with_keyboard(text, markup),
            None => Reply::text(text),
        })
    }
}

/// Catalogue overview grouped by category.
pub fn exercises_overview(exercises: &[Exercise]) -> String {
    if exercises.is_empty() {
        return "💪 Упражнения\n\nПод ваше оборудование пока нет упражнений.".to_string();
    }

    let mut by_category: BTreeMap<&str, Vec<&Exercise>> = BTreeMap::new();
    for exercise in exercises {
        by_category.entry(exercise.category.as_str()).or_default().push(exercise);
    }

    let mut text = String::from("💪 Упражнения\n");
    let known = EXERCISE_CATEGORIES.iter().copied();
    let extra = by_category
        .keys()
        .copied()
        .filter(|c| !EXERCISE_CATEGORIES.contains(c))
        .collect::<Vec<_>>();
    for category in known.chain(extra) {
        let Some(list) = by_category.get(category) else {
            continue;
        };
        text.push_str(&format!("\n{}\n", category_label(category)));
        for exercise in list.iter().take(EXERCISES_PER_CATEGORY) {
            text.push_str(&format!("• {}\n", exercise.name));
        }
        if list.len() > EXERCISES_PER_CATEGORY {
            text.push_str(&format!("  …и еще {}\n", list.len() - EXERCISES_PER_CATEGORY));
        }
    }
    text.push_str("\nВыберите категорию:");
    text
}

pub struct ExercisesCommand {
    deps: HandlerDeps,
}

impl ExercisesCommand {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for ExercisesCommand {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let cmd = command(event)?;
        let conn = self.deps.conn()?;
        let user = ensure_user(&conn, cmd.user_id).map_err(FlowError::storage("Ошибка при получении пользователя"))?;
        let exercises = list_exercises_for_equipment(&conn, &user.equipment_ids)
            .map_err(FlowError::storage("Ошибка получения упражнений"))?;

        let categories = EXERCISE_CATEGORIES
            .iter()
            .copied()
            .filter(|c| exercises.iter().any(|e| e.category == *c))
            .collect::<Vec<_>>();
        Ok(Reply::with_keyboard(
            exercises_overview(&exercises),
            keyboards::exercise_categories(&categories),
        ))
    }
}

pub fn settings_summary(user: &User) -> String {
    let goals = user
        .goals
        .iter()
        .map(|g| g.parse::<Goal>().map_or(g.as_str(), |goal| goal.label()))
        .collect::<Vec<_>>();
    let equipment = user.equipment_ids.iter().map(|id| equipment_label(*id)).collect::<Vec<_>>();
    let experience = ExperienceLevel::from_value(user.experience).map_or("не указан", ExperienceLevel::label);

    let or_unset = |items: Vec<&str>| {
        if items.is_empty() {
            "не указано".to_string()
        } else {
            items.join(", ")
        }
    };
    format!(
        "{}\n\n🎯 Цели: {}\n🏋️ Оборудование: {}\n📈 Опыт: {}",
        SETTINGS_MENU_TEXT,
        or_unset(goals),
        or_unset(equipment),
        experience
    )
}

pub struct SettingsCommand {
    deps: HandlerDeps,
}

impl SettingsCommand {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for SettingsCommand {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let cmd = command(event)?;
        let conn = self.deps.conn()?;
        let user = ensure_user(&conn, cmd.user_id).map_err(FlowError::storage("Ошибка при получении пользователя"))?;
        Ok(Reply::with_keyboard(settings_summary(&user), keyboards::settings()))
    }
}
