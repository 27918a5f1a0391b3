//! Push transport: axum listener receiving webhook deliveries.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, Update};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::config::WebhookConfig;
use crate::core::error::AppResult;
use crate::core::metrics::Metrics;
use crate::storage::migrations::run_migrations;
use crate::storage::{get_connection, DbPool};
use crate::telegram::event::InboundEvent;

/// Header Telegram uses to echo the secret given at registration.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    pub events: mpsc::Sender<InboundEvent>,
    pub db_pool: Arc<DbPool>,
    pub metrics: Arc<Metrics>,
    pub secret_token: Option<Arc<str>>,
}

/// Delivery route at `path` plus the auxiliary endpoints.
pub fn router(path: &str, state: WebhookState) -> Router {
    Router::new()
        .route(path, post(handle_update))
        .route("/health", get(health_handler))
        .route("/ping", get(ping_handler))
        .route("/migrate", post(migrate_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn handle_update(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    if let Some(expected) = state.secret_token.as_deref() {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            log::warn!("Rejected webhook delivery with a missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            // Telegram redelivers on non-2xx, so an unreadable update is acknowledged and dropped.
            log::error!("Failed to parse webhook update: {}", e);
            return StatusCode::OK;
        }
    };

    let Some(event) = InboundEvent::from_update(update) else {
        return StatusCode::OK;
    };
    match state.events.send(event).await {
        Ok(()) => StatusCode::OK,
        Err(_) => {
            log::warn!("Dispatcher is not accepting events, rejecting delivery");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn ping_handler() -> &'static str {
    "PONG"
}

/// Applies pending migrations on demand.
async fn migrate_handler(State(state): State<WebhookState>) -> Response {
    let pool = Arc::clone(&state.db_pool);
    let result = tokio::task::spawn_blocking(move || -> AppResult<usize> {
        let mut conn = get_connection(&pool)?;
        run_migrations(&mut conn)
    })
    .await;

    match result {
        Ok(Ok(applied)) => {
            log::info!("Migrations triggered over HTTP, {} applied", applied);
            (StatusCode::OK, "MIGRATED").into_response()
        }
        Ok(Err(e)) => {
            log::error!("Migration over HTTP failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Migration failed: {}", e)).into_response()
        }
        Err(e) => {
            log::error!("Migration task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Migration failed").into_response()
        }
    }
}

async fn metrics_handler(State(state): State<WebhookState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e)).into_response()
        }
    }
}

/// Listener bound and registered with Telegram, ready to serve.
pub struct WebhookTransport {
    bot: Bot,
    listener: TcpListener,
    app: Router,
}

impl WebhookTransport {
    /// Binds the port and registers the webhook. Both failures are fatal.
    pub async fn bind(bot: Bot, config: &WebhookConfig, state: WebhookState) -> AppResult<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await?;
        log::info!("Webhook listener bound on http://{}", listener.local_addr()?);

        let endpoint = config.endpoint()?;
        let mut request = bot
            .set_webhook(endpoint.clone())
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);
        if let Some(secret) = &config.secret_token {
            request = request.secret_token(secret.clone());
        }
        request.await?;
        log::info!("Webhook registered at {}", endpoint);

        let app = router(&config.path, state);
        Ok(Self { bot, listener, app })
    }

    /// Address the listener actually bound, which differs from the
    /// configured one when port 0 is requested.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves deliveries until cancelled. The webhook is deleted before the
    /// listener closes.
    pub async fn run(self, cancel: CancellationToken) {
        let bot = self.bot;
        let shutdown = async move {
            cancel.cancelled().await;
            match bot.delete_webhook().await {
                Ok(_) => log::info!("Webhook deleted"),
                Err(e) => log::error!("Failed to delete webhook on shutdown: {}", e),
            }
        };

        if let Err(e) = axum::serve(self.listener, self.app).with_graceful_shutdown(shutdown).await {
            log::error!("Webhook listener error: {}", e);
        }
        log::info!("Webhook listener stopped");
    }
}
