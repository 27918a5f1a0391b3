//! Telegram integration: events, action tokens, conversation flows,
//! dispatch and the two update transports.

pub mod action;
pub mod bot;
pub mod dispatcher;
pub mod event;
pub mod flows;
pub mod keyboards;
pub mod registry;
pub mod reply;
pub mod transport;

pub use bot::{create_bot, setup_bot_commands};
pub use dispatcher::{Dispatcher, ShutdownOutcome};
pub use event::InboundEvent;
pub use flows::{default_registries, HandlerDeps};
pub use reply::{ReplySink, TelegramSink};
