//! Conversation flows, one module per callback domain plus the menu commands.
//!
//! Handlers keep no state between events. Whatever a later step needs is
//! either encoded in the buttons of the current screen or persisted
//! (workout status, logged sets).

pub mod exercise;
pub mod menu;
pub mod sets;
pub mod settings;
pub mod wizard;
pub mod workout;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::error::AppError;
use crate::core::media::MediaLocator;
use crate::storage::{get_connection, DbConnection, DbPool};
use crate::telegram::action::{ActionToken, Domain, FormatError};
use crate::telegram::bot::MenuCommand;
use crate::telegram::event::{ButtonPress, CommandEvent, InboundEvent};
use crate::telegram::registry::{RegistryError, Registries};

/// Why a conversation step could not produce its normal reply.
///
/// Every variant maps to a short chat message; none of them is fatal.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("malformed action token: {0}")]
    Format(#[from] FormatError),

    #[error("rejected value: {0}")]
    Invalid(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("user {requester} tried to access workout {workout_id} owned by {owner}")]
    Forbidden { requester: i64, owner: i64, workout_id: i64 },

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: AppError,
    },

    #[error("handler expects a {0} event")]
    WrongEvent(&'static str),
}

impl FlowError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Format(_) => "❌ Неверный формат команды".to_string(),
            FlowError::Invalid(msg) | FlowError::NotFound(msg) => format!("❌ {}", msg),
            FlowError::Forbidden { .. } => "❌ Нет доступа к этой тренировке".to_string(),
            FlowError::Storage { context, .. } => format!("❌ {}", context),
            FlowError::WrongEvent(_) => "❌ Неизвестная команда".to_string(),
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Format(_) => "format",
            FlowError::Invalid(_) => "invalid",
            FlowError::NotFound(_) => "not_found",
            FlowError::Forbidden { .. } => "forbidden",
            FlowError::Storage { .. } => "storage",
            FlowError::WrongEvent(_) => "wrong_event",
        }
    }

    /// Adapter for `map_err` on storage calls.
    pub fn storage(context: &'static str) -> impl FnOnce(AppError) -> FlowError {
        move |source| FlowError::Storage { context, source }
    }

    /// Adapter for `map_err` on argument parsing, replacing the generic
    /// format message with a specific one.
    pub fn invalid(message: &'static str) -> impl FnOnce(FormatError) -> FlowError {
        move |err| match err {
            FormatError::InvalidArgument { .. } => FlowError::Invalid(message),
            other => FlowError::Format(other),
        }
    }
}

/// Collaborators shared by all handlers.
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub media: Arc<MediaLocator>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, media: Arc<MediaLocator>) -> Self {
        Self { db_pool, media }
    }

    pub fn conn(&self) -> Result<DbConnection, FlowError> {
        get_connection(&self.db_pool).map_err(FlowError::storage("Ошибка базы данных"))
    }
}

/// The button press behind an event together with its decoded token.
pub(crate) fn button_press(event: &InboundEvent) -> Result<(&ButtonPress, ActionToken), FlowError> {
    match event {
        InboundEvent::ButtonPress(press) => Ok((press, ActionToken::decode(&press.payload)?)),
        InboundEvent::Command(_) => Err(FlowError::WrongEvent("button")),
    }
}

pub(crate) fn command(event: &InboundEvent) -> Result<&CommandEvent, FlowError> {
    match event {
        InboundEvent::Command(cmd) => Ok(cmd),
        InboundEvent::ButtonPress(_) => Err(FlowError::WrongEvent("command")),
    }
}

/// Timestamp in the same shape SQLite's CURRENT_TIMESTAMP produces.
pub(crate) fn db_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Builds both dispatch tables with every handler the bot ships.
pub fn default_registries(deps: &HandlerDeps) -> Result<Registries, RegistryError> {
    let mut registries = Registries::default();

    let commands = &mut registries.commands;
    commands.register(MenuCommand::Start, Arc::new(menu::StartCommand::new(deps.clone())))?;
    commands.register(MenuCommand::CreateWorkout, Arc::new(menu::CreateWorkoutCommand))?;
    commands.register(MenuCommand::MyWorkouts, Arc::new(menu::MyWorkoutsCommand::new(deps.clone())))?;
    commands.register(MenuCommand::Exercises, Arc::new(menu::ExercisesCommand::new(deps.clone())))?;
    commands.register(MenuCommand::Settings, Arc::new(menu::SettingsCommand::new(deps.clone())))?;

    let callbacks = &mut registries.callbacks;
    callbacks.register(Domain::WorkoutType, Arc::new(wizard::WorkoutTypeHandler))?;
    callbacks.register(Domain::Duration, Arc::new(wizard::DurationHandler::new(deps.clone())))?;
    callbacks.register(Domain::Goal, Arc::new(settings::GoalHandler::new(deps.clone())))?;
    callbacks.register(Domain::Equipment, Arc::new(settings::EquipmentHandler::new(deps.clone())))?;
    callbacks.register(Domain::Experience, Arc::new(settings::ExperienceHandler::new(deps.clone())))?;
    callbacks.register(Domain::Settings, Arc::new(settings::SettingsMenuHandler))?;
    callbacks.register(Domain::Exercise, Arc::new(exercise::ExerciseHandler::new(deps.clone())))?;
    callbacks.register(Domain::Exercises, Arc::new(exercise::CategoryHandler::new(deps.clone())))?;
    callbacks.register(Domain::Workout, Arc::new(workout::WorkoutHandler::new(deps.clone())))?;
    callbacks.register(Domain::Workouts, Arc::new(workout::WorkoutListHandler::new(deps.clone())))?;
    callbacks.register(Domain::Confirm, Arc::new(workout::ConfirmHandler::new(deps.clone())))?;
    callbacks.register(Domain::Set, Arc::new(sets::SetHandler::new(deps.clone())))?;

    Ok(registries)
}
