//! Training preferences: goals, equipment and experience.

use async_trait::async_trait;

use crate::core::types::{EquipmentPreset, ExperienceLevel, Goal};
use crate::storage::db::{ensure_user, save_user_settings, User};
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::{button_press, FlowError, HandlerDeps};
use crate::telegram::keyboards;
use crate::telegram::registry::Handler;
use crate::telegram::reply::Reply;

pub const SETTINGS_MENU_TEXT: &str = "⚙️ Настройки\n\nВыберите, что хотите изменить:";

/// Screen for a `settings` sub-action.
pub fn settings_screen(message_id: i32, section: &str) -> Result<Reply, FlowError> {
    let (text, markup) = match section {
        "main" => (SETTINGS_MENU_TEXT, keyboards::settings()),
        "goals" => ("🎯 Выберите ваши цели тренировок:", keyboards::goals()),
        "equipment" => ("🏋️ Какое оборудование у вас есть?", keyboards::equipment()),
        "experience" => ("📈 Какой у вас уровень опыта в тренировках?", keyboards::experience()),
        "limitations" => ("⚠️ Есть ли у вас ограничения по здоровью?", keyboards::limitations()),
        _ => return Err(FlowError::Invalid("Неизвестная настройка")),
    };
    Ok(Reply::edit(message_id, text, Some(markup)))
}

/// Loads the user, applies `change` and writes the settings back in one upsert.
fn update_user(deps: &HandlerDeps, telegram_id: i64, change: impl FnOnce(&mut User)) -> Result<User, FlowError> {
    let conn = deps.conn()?;
    let mut user = ensure_user(&conn, telegram_id).map_err(FlowError::storage("Пользователь не найден"))?;
    change(&mut user);
    save_user_settings(&conn, &user).map_err(FlowError::storage("Ошибка сохранения настроек"))?;
    Ok(user)
}

fn confirmation(message_id: i32, text: String) -> Reply {
    Reply::edit(message_id, text, Some(keyboards::settings()))
}

/// `goal:<muscle_gain|strength|endurance|weight_loss>`
pub struct GoalHandler {
    deps: HandlerDeps,
}

impl GoalHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for GoalHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;
        let goal = token
            .arg(0)?
            .parse::<Goal>()
            .map_err(|_| FlowError::Invalid("Неизвестная цель"))?;

        update_user(&self.deps, press.user_id, |user| {
            user.goals = vec![goal.as_ref().to_string()];
        })?;

        log::info!("User {} set goal {}", press.user_id, goal);
        Ok(confirmation(
            press.message_id,
            format!("✅ Цель обновлена!\n\nТекущая цель: {}", goal.label()),
        ))
    }
}

/// `equipment:<home|gym|none|custom>`
pub struct EquipmentHandler {
    deps: HandlerDeps,
}

impl EquipmentHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for EquipmentHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;
        let preset = token
            .arg(0)?
            .parse::<EquipmentPreset>()
            .map_err(|_| FlowError::Invalid("Неизвестное оборудование"))?;

        let Some(equipment_ids) = preset.equipment_ids() else {
            return Ok(Reply::edit(
                press.message_id,
                "⚙️ Настройка оборудования\n\nВыберите, где вы тренируетесь:",
                Some(keyboards::equipment_custom()),
            ));
        };

        update_user(&self.deps, press.user_id, |user| user.equipment_ids = equipment_ids)?;

        log::info!("User {} set equipment {}", press.user_id, preset);
        Ok(confirmation(
            press.message_id,
            format!("✅ Оборудование обновлено!\n\nСейчас: {}", preset.label()),
        ))
    }
}

/// `experience:<1|3|5|7>`
pub struct ExperienceHandler {
    deps: HandlerDeps,
}

impl ExperienceHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for ExperienceHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;
        let level = token
            .arg(0)?
            .parse::<ExperienceLevel>()
            .map_err(|_| FlowError::Invalid("Неверный уровень опыта"))?;

        update_user(&self.deps, press.user_id, |user| user.experience = level.value())?;

        log::info!("User {} set experience {}", press.user_id, level.value());
        Ok(confirmation(
            press.message_id,
            format!("✅ Уровень опыта обновлен!\n\nСейчас: {}", level.label()),
        ))
    }
}

/// `settings:<main|goals|equipment|experience|limitations>`
pub struct SettingsMenuHandler;

#[async_trait]
impl Handler for SettingsMenuHandler {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError> {
        let (press, token) = button_press(event)?;
        token.require(2)?;
        settings_screen(press.message_id, token.arg(0)?)
    }
}
