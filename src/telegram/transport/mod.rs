//! Update ingestion. Both transports feed the same event channel.

pub mod polling;
pub mod webhook;

use std::sync::Arc;

use teloxide::Bot;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::{Config, TransportMode};
use crate::core::error::AppResult;
use crate::core::metrics::Metrics;
use crate::storage::DbPool;
use crate::telegram::event::InboundEvent;

pub use polling::PollingTransport;
pub use webhook::{router, WebhookState, WebhookTransport};

/// Events buffered between the transport and the dispatcher.
pub const EVENT_BUFFER: usize = 256;

/// Starts the transport selected by `config.mode`.
///
/// Startup failures (bind, webhook registration) are returned; once running,
/// the transport only logs its errors and stops when `cancel` fires.
pub async fn start(
    config: &Config,
    bot: Bot,
    db_pool: Arc<DbPool>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) -> AppResult<(mpsc::Receiver<InboundEvent>, JoinHandle<()>)> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    let handle = match config.mode {
        TransportMode::Pull => {
            let transport = PollingTransport::new(bot, config.poll_timeout);
            transport.prepare().await;
            tokio::spawn(transport.run(tx, cancel))
        }
        TransportMode::Push => {
            let state = WebhookState {
                events: tx,
                db_pool,
                metrics,
                secret_token: config.webhook.secret_token.as_deref().map(Arc::from),
            };
            let transport = WebhookTransport::bind(bot, &config.webhook, state).await?;
            tokio::spawn(transport.run(cancel))
        }
    };

    log::info!("Transport started in {} mode", config.mode);
    Ok((rx, handle))
}
