//! Inbound chat events, independent of how they reached us.

use chrono::{DateTime, Utc};
use teloxide::types::{Update, UpdateKind};

/// Typed text from a user, matched against the menu labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub text: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub chat_id: i64,
    pub user_id: i64,
    /// Message that carries the pressed keyboard
    pub message_id: i32,
    /// Callback query id, answered to stop the client spinner
    pub callback_id: String,
    /// Encoded action token
    pub payload: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command(CommandEvent),
    ButtonPress(ButtonPress),
}

impl InboundEvent {
    /// Converts a raw Telegram update. Updates that are neither text messages
    /// nor callback queries with data produce no event.
    pub fn from_update(update: Update) -> Option<Self> {
        match update.kind {
            UpdateKind::Message(msg) => {
                let text = msg.text()?.to_string();
                let chat_id = msg.chat.id.0;
                let from = msg.from.as_ref();
                Some(InboundEvent::Command(CommandEvent {
                    chat_id,
                    user_id: from.and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(chat_id),
                    text,
                    username: from.and_then(|u| u.username.clone()),
                    first_name: from.map(|u| u.first_name.clone()),
                    last_name: from.and_then(|u| u.last_name.clone()),
                }))
            }
            UpdateKind::CallbackQuery(query) => {
                let message = query.message.as_ref()?;
                let payload = query.data.clone()?;
                Some(InboundEvent::ButtonPress(ButtonPress {
                    chat_id: message.chat().id.0,
                    user_id: i64::try_from(query.from.id.0).ok()?,
                    message_id: message.id().0,
                    callback_id: query.id.0.clone(),
                    payload,
                    received_at: Utc::now(),
                }))
            }
            _ => None,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            InboundEvent::Command(cmd) => cmd.chat_id,
            InboundEvent::ButtonPress(press) => press.chat_id,
        }
    }

    pub fn user_id(&self) -> i64 {
        match self {
            InboundEvent::Command(cmd) => cmd.user_id,
            InboundEvent::ButtonPress(press) => press.user_id,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Command(_) => "command",
            InboundEvent::ButtonPress(_) => "button",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        // teloxide's `UpdateKind` only deserializes from string input;
        // `from_value` yields `UpdateKind::Error`.
        serde_json::from_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_text_message_becomes_command() {
        let event = InboundEvent::from_update(update(json!({
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ира"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ира", "username": "ira"},
                "text": "/start"
            }
        })))
        .unwrap();

        match event {
            InboundEvent::Command(cmd) => {
                assert_eq!(cmd.chat_id, 42);
                assert_eq!(cmd.user_id, 42);
                assert_eq!(cmd.text, "/start");
                assert_eq!(cmd.username.as_deref(), Some("ira"));
                assert_eq!(cmd.first_name.as_deref(), Some("Ира"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_callback_query_becomes_button_press() {
        let event = InboundEvent::from_update(update(json!({
            "update_id": 11,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 42, "is_bot": false, "first_name": "Ира"},
                "chat_instance": "ci",
                "data": "workout_type:split",
                "message": {
                    "message_id": 77,
                    "date": 1_700_000_000,
                    "chat": {"id": 42, "type": "private", "first_name": "Ира"},
                    "text": "menu"
                }
            }
        })))
        .unwrap();

        match event {
            InboundEvent::ButtonPress(press) => {
                assert_eq!(press.chat_id, 42);
                assert_eq!(press.user_id, 42);
                assert_eq!(press.message_id, 77);
                assert_eq!(press.callback_id, "cb-1");
                assert_eq!(press.payload, "workout_type:split");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_edited_message_is_ignored() {
        let event = InboundEvent::from_update(update(json!({
            "update_id": 12,
            "edited_message": {
                "message_id": 6,
                "date": 1_700_000_000,
                "edit_date": 1_700_000_100,
                "chat": {"id": 42, "type": "private", "first_name": "Ира"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ира"},
                "text": "/start"
            }
        })));
        assert!(event.is_none());
    }
}
