//! Bot client construction and the menu commands it understands.

use std::time::Duration;

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use strum::{AsRefStr, EnumIter, EnumString};
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config::Config;
use crate::core::error::AppResult;

/// Commands shown in the Telegram command menu.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
}

/// Menu entries matched by their exact text.
///
/// Anything that does not parse is answered with an "invalid command" reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
pub enum MenuCommand {
    #[strum(serialize = "/start")]
    Start,
    #[strum(serialize = "🏋️ Создать тренировку")]
    CreateWorkout,
    #[strum(serialize = "📊 Мои тренировки")]
    MyWorkouts,
    #[strum(serialize = "💪 Упражнения")]
    Exercises,
    #[strum(serialize = "⚙️ Настройки")]
    Settings,
}

/// Extra room on top of the long-poll wait before the HTTP client gives up.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Creates a Bot instance with custom or default API URL
///
/// The HTTP timeout is derived from the long-poll timeout so `getUpdates`
/// never times out client-side before Telegram answers.
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let client = ClientBuilder::new()
        .timeout(config.poll_timeout + REQUEST_TIMEOUT_MARGIN)
        .build()?;
    let bot = Bot::with_client(config.bot_token.expose_secret(), client);

    let bot = match &config.bot_api_url {
        Some(url) => {
            log::info!("Using custom Bot API URL: {}", url);
            bot.set_api_url(url.clone())
        }
        None => bot,
    };

    Ok(bot)
}

/// Registers the slash commands in the Telegram UI.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = Command::bot_commands();
    bot.set_my_commands(commands).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_menu_commands_match_exact_text() {
        assert_eq!("/start".parse::<MenuCommand>().unwrap(), MenuCommand::Start);
        assert_eq!(
            "📊 Мои тренировки".parse::<MenuCommand>().unwrap(),
            MenuCommand::MyWorkouts
        );
        assert!("мои тренировки".parse::<MenuCommand>().is_err());
        assert!("/start ".parse::<MenuCommand>().is_err());
    }

    #[test]
    fn test_menu_labels_round_trip() {
        for command in MenuCommand::iter() {
            assert_eq!(command.as_ref().parse::<MenuCommand>().unwrap(), command);
        }
    }

    #[test]
    fn test_bot_commands_list() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].command.ends_with("start"));
    }
}
