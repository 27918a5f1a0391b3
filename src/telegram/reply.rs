//! Outbound replies and the sink that delivers them.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, InlineKeyboardMarkup, InputFile, MessageId, ReplyMarkup};
use url::Url;

use crate::core::error::AppResult;

/// What a handler wants shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A new message, optionally with a keyboard
    Send { text: String, markup: Option<ReplyMarkup> },
    /// Replace the text and inline keyboard of an existing message
    Edit {
        message_id: i32,
        text: String,
        markup: Option<InlineKeyboardMarkup>,
    },
    /// A video fetched by Telegram from a public URL
    Video { url: Url, caption: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Send {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, markup: impl Into<ReplyMarkup>) -> Self {
        Reply::Send {
            text: text.into(),
            markup: Some(markup.into()),
        }
    }

    pub fn edit(message_id: i32, text: impl Into<String>, markup: Option<InlineKeyboardMarkup>) -> Self {
        Reply::Edit {
            message_id,
            text: text.into(),
            markup,
        }
    }

    /// Text of the reply, or the caption of a video.
    pub fn body(&self) -> &str {
        match self {
            Reply::Send { text, .. } | Reply::Edit { text, .. } => text,
            Reply::Video { caption, .. } => caption,
        }
    }

    /// The inline keyboard attached to the reply, if any.
    pub fn inline_keyboard(&self) -> Option<&InlineKeyboardMarkup> {
        match self {
            Reply::Send {
                markup: Some(ReplyMarkup::InlineKeyboard(markup)),
                ..
            } => Some(markup),
            Reply::Edit {
                markup: Some(markup), ..
            } => Some(markup),
            _ => None,
        }
    }
}

/// Where replies go. The Telegram implementation is used in production,
/// tests record replies instead.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, chat_id: i64, reply: Reply) -> AppResult<()>;

    /// Answers a callback query so the client stops showing a spinner.
    async fn acknowledge(&self, callback_id: &str) -> AppResult<()>;
}

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn deliver(&self, chat_id: i64, reply: Reply) -> AppResult<()> {
        let chat = ChatId(chat_id);
        match reply {
            Reply::Send { text, markup } => {
                let request = self.bot.send_message(chat, text);
                match markup {
                    Some(markup) => request.reply_markup(markup).await?,
                    None => request.await?,
                };
            }
            Reply::Edit {
                message_id,
                text,
                markup,
            } => {
                let request = self.bot.edit_message_text(chat, MessageId(message_id), text);
                match markup {
                    Some(markup) => request.reply_markup(markup).await?,
                    None => request.await?,
                };
            }
            Reply::Video { url, caption } => {
                self.bot.send_video(chat, InputFile::url(url)).caption(caption).await?;
            }
        }
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> AppResult<()> {
        self.bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()))
            .await?;
        Ok(())
    }
}
