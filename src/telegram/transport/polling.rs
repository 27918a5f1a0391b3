//! Pull transport: long polling with `getUpdates`.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::telegram::event::InboundEvent;

/// Upper bound for the pause between failed requests.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Pause before retry number `attempt` (1-based): 1s, 2s, 4s ... capped.
pub fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

pub struct PollingTransport {
    bot: Bot,
    poll_timeout: Duration,
}

impl PollingTransport {
    pub fn new(bot: Bot, poll_timeout: Duration) -> Self {
        Self { bot, poll_timeout }
    }

    /// Clears a webhook left over from push mode. Telegram refuses
    /// `getUpdates` while one is registered.
    pub async fn prepare(&self) {
        match self.bot.delete_webhook().await {
            Ok(_) => log::info!("Webhook registration cleared for long polling"),
            Err(e) => log::warn!("Failed to delete webhook before polling: {}", e),
        }
    }

    /// Polls until cancelled or the receiving side goes away.
    pub async fn run(self, events: mpsc::Sender<InboundEvent>, cancel: CancellationToken) {
        let timeout_secs = u32::try_from(self.poll_timeout.as_secs()).unwrap_or(u32::MAX);
        let mut offset: i32 = 0;
        let mut failures: u32 = 0;

        log::info!("Long polling started (timeout {}s)", timeout_secs);
        loop {
            let request = self
                .bot
                .get_updates()
                .offset(offset)
                .timeout(timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = i32::try_from(update.id.0).map_or(offset, |id| id.saturating_add(1));
                        let Some(event) = InboundEvent::from_update(update) else {
                            continue;
                        };
                        if events.send(event).await.is_err() {
                            log::warn!("Dispatcher is gone, stopping long polling");
                            return;
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff_delay(failures);
                    log::error!("getUpdates failed (attempt {}): {}. Retrying in {:?}", failures, e, delay);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        log::info!("Long polling stopped");
    }
}
