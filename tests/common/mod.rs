//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};
use url::Url;

use workouts_bot::core::config::MediaConfig;
use workouts_bot::core::error::AppResult;
use workouts_bot::core::media::MediaLocator;
use workouts_bot::core::Metrics;
use workouts_bot::storage::db::ensure_user;
use workouts_bot::storage::workouts::{
    add_exercise_to_workout, create_workout, NewWorkoutExercise, Workout, WorkoutExercise,
};
use workouts_bot::storage::{create_pool, get_connection, DbConnection, DbPool};
use workouts_bot::telegram::dispatcher::handle_event;
use workouts_bot::telegram::event::{ButtonPress, CommandEvent, InboundEvent};
use workouts_bot::telegram::flows::{default_registries, HandlerDeps};
use workouts_bot::telegram::registry::Registries;
use workouts_bot::telegram::reply::{Reply, ReplySink};

/// Reply sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    pub replies: Mutex<Vec<(i64, Reply)>>,
    pub acks: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn bodies(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .map(|(_, reply)| reply.body().to_string())
            .collect()
    }

    pub fn last(&self) -> Reply {
        self.replies.lock().unwrap().last().cloned().unwrap().1
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn deliver(&self, chat_id: i64, reply: Reply) -> AppResult<()> {
        self.replies.lock().unwrap().push((chat_id, reply));
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> AppResult<()> {
        self.acks.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}

/// Migrated database, production registries and a recording sink.
pub struct TestEnv {
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub registries: Arc<Registries>,
    pub sink: Arc<RecordingSink>,
    pub metrics: Arc<Metrics>,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.sqlite");
        let pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());
        let media = MediaLocator::new(&MediaConfig {
            endpoint: Url::parse("https://storage.yandexcloud.net").unwrap(),
            bucket: Some("workouts-media".to_string()),
        });
        let deps = HandlerDeps::new(Arc::clone(&pool), Arc::new(media));

        Self {
            _dir: dir,
            pool,
            registries: Arc::new(default_registries(&deps).unwrap()),
            sink: Arc::new(RecordingSink::default()),
            metrics: Arc::new(Metrics::new().unwrap()),
        }
    }

    pub fn conn(&self) -> DbConnection {
        get_connection(&self.pool).unwrap()
    }

    /// Runs one event through the full dispatch path.
    pub async fn handle(&self, event: InboundEvent) {
        handle_event(&self.registries, self.sink.as_ref(), &self.metrics, event).await;
    }

    /// Body of the last reply.
    pub fn last_body(&self) -> String {
        self.sink.last().body().to_string()
    }

    /// Workout owned by `telegram_id`.
    pub fn seed_workout(&self, telegram_id: i64, name: &str) -> Workout {
        let conn = self.conn();
        let user = ensure_user(&conn, telegram_id).unwrap();
        create_workout(&conn, user.id, name, "fullbody").unwrap()
    }

    /// Attaches catalogue exercise `exercise_id` with the default plan.
    pub fn seed_slot(&self, workout_id: i64, exercise_id: i64) -> WorkoutExercise {
        add_exercise_to_workout(&self.conn(), &NewWorkoutExercise::with_defaults(workout_id, exercise_id)).unwrap()
    }
}

pub fn press(user_id: i64, payload: &str) -> InboundEvent {
    InboundEvent::ButtonPress(ButtonPress {
        chat_id: user_id,
        user_id,
        message_id: 100,
        callback_id: format!("cb-{}", payload),
        payload: payload.to_string(),
        received_at: Utc::now(),
    })
}

pub fn text(user_id: i64, text: &str) -> InboundEvent {
    InboundEvent::Command(CommandEvent {
        chat_id: user_id,
        user_id,
        text: text.to_string(),
        username: Some("athlete".to_string()),
        first_name: Some("Иван".to_string()),
        last_name: None,
    })
}

/// Callback payloads of an inline keyboard, row by row.
pub fn payloads(markup: &InlineKeyboardMarkup) -> Vec<String> {
    markup
        .inline_keyboard
        .iter()
        .flatten()
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}
