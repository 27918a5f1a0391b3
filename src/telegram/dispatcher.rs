//! Event dispatch with graceful shutdown.
//!
//! Every inbound event becomes its own tracked tokio task. On cancellation
//! the dispatcher stops taking events, closes the tracker and waits, up to
//! the shutdown timeout, for the running tasks to finish on their own.

use std::sync::Arc;
use std::time::Duration;

use prometheus::IntGauge;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::metrics::Metrics;
use crate::telegram::action::ActionToken;
use crate::telegram::bot::MenuCommand;
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::FlowError;
use crate::telegram::registry::Registries;
use crate::telegram::reply::{Reply, ReplySink};

/// Reply to text that is not a menu entry.
pub const INVALID_COMMAND_TEXT: &str = "❌ Неверная команда. Воспользуйтесь меню ниже.";

/// Reply to a button whose domain has no handler.
pub const UNKNOWN_COMMAND_TEXT: &str = "❌ Неизвестная команда";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// All in-flight handlers finished within the timeout
    Completed,
    /// The timeout elapsed with handlers still running
    TimedOut,
}

/// Keeps the in-flight gauge balanced even if the handler panics.
struct InFlight<'a>(&'a IntGauge);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

pub struct Dispatcher {
    registries: Arc<Registries>,
    sink: Arc<dyn ReplySink>,
    metrics: Arc<Metrics>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(registries: Arc<Registries>, sink: Arc<dyn ReplySink>, metrics: Arc<Metrics>) -> Self {
        Self {
            registries,
            sink,
            metrics,
            tracker: TaskTracker::new(),
        }
    }

    /// Consumes events until `cancel` fires or the event source closes,
    /// then waits for in-flight handlers.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<InboundEvent>,
        cancel: CancellationToken,
        shutdown_timeout: Duration,
    ) -> ShutdownOutcome {
        log::info!("Dispatcher started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!("Shutdown requested, no longer accepting events");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => {
                        log::warn!("Event source closed");
                        break;
                    }
                },
            }
        }

        self.shutdown(shutdown_timeout).await
    }

    /// Spawns a handling unit for one event. Never awaited by the caller.
    pub fn dispatch(&self, event: InboundEvent) {
        let registries = Arc::clone(&self.registries);
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);
        self.tracker.spawn(async move {
            handle_event(&registries, sink.as_ref(), &metrics, event).await;
        });
    }

    async fn shutdown(&self, timeout: Duration) -> ShutdownOutcome {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            log::info!("Waiting up to {:?} for {} in-flight handlers", timeout, pending);
        }

        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => {
                log::info!("Shutdown completed");
                ShutdownOutcome::Completed
            }
            Err(_) => {
                log::warn!(
                    "Shutdown timed out after {:?}, forcing exit with {} handlers still running",
                    timeout,
                    self.tracker.len()
                );
                ShutdownOutcome::TimedOut
            }
        }
    }
}

/// One handling unit: route, run, reply. Every failure ends here.
pub async fn handle_event(registries: &Registries, sink: &dyn ReplySink, metrics: &Metrics, event: InboundEvent) {
    let _in_flight = InFlight::enter(&metrics.in_flight);
    metrics.events_total.with_label_values(&[event.kind()]).inc();
    let chat_id = event.chat_id();

    let (domain, handler) = match &event {
        InboundEvent::Command(cmd) => match cmd.text.parse::<MenuCommand>() {
            Ok(command) => ("command".to_string(), registries.commands.resolve(&command)),
            Err(_) => {
                log::debug!("Unrecognized text from user {}: {:?}", cmd.user_id, cmd.text);
                deliver(sink, chat_id, Reply::text(INVALID_COMMAND_TEXT)).await;
                return;
            }
        },
        InboundEvent::ButtonPress(press) => {
            if let Err(e) = sink.acknowledge(&press.callback_id).await {
                log::warn!("Failed to answer callback {}: {}", press.callback_id, e);
            }
            match ActionToken::decode(&press.payload) {
                Ok(token) => {
                    let domain = token.domain();
                    (domain.key().to_string(), registries.callbacks.resolve(&domain))
                }
                Err(e) => {
                    log::warn!("Malformed payload {:?} from user {}: {}", press.payload, press.user_id, e);
                    let err = FlowError::from(e);
                    record_failure(metrics, "unknown", &err);
                    deliver(sink, chat_id, Reply::text(err.user_message())).await;
                    return;
                }
            }
        }
    };

    let Some(handler) = handler else {
        log::warn!("No handler for {} from user {}", domain, event.user_id());
        deliver(sink, chat_id, Reply::text(UNKNOWN_COMMAND_TEXT)).await;
        return;
    };

    let reply = match handler.handle(&event).await {
        Ok(reply) => reply,
        Err(err) => {
            log_failure(&domain, event.user_id(), &err);
            record_failure(metrics, &domain, &err);
            Reply::text(err.user_message())
        }
    };
    deliver(sink, chat_id, reply).await;
}

fn log_failure(domain: &str, user_id: i64, err: &FlowError) {
    match err {
        FlowError::NotFound(_) => log::error!("[{}] user {}: {}", domain, user_id, err),
        FlowError::Storage { context, source } => {
            log::error!("[{}] user {}: {}: {:?}", domain, user_id, context, source)
        }
        _ => log::warn!("[{}] user {}: {}", domain, user_id, err),
    }
}

fn record_failure(metrics: &Metrics, domain: &str, err: &FlowError) {
    metrics
        .handler_failures_total
        .with_label_values(&[domain, err.kind()])
        .inc();
}

async fn deliver(sink: &dyn ReplySink, chat_id: i64, reply: Reply) {
    if let Err(e) = sink.deliver(chat_id, reply).await {
        log::error!("Failed to deliver reply to chat {}: {}", chat_id, e);
    }
}
