use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

use workouts_bot::cli::{Cli, Commands};
use workouts_bot::core::config::{LogConfig, DEFAULT_DATABASE_PATH, DEFAULT_PORT};
use workouts_bot::core::logging::init_logger;
use workouts_bot::core::media::MediaLocator;
use workouts_bot::core::{Config, Metrics, TransportMode};
use workouts_bot::storage::create_pool;
use workouts_bot::storage::migrations::run_migrations;
use workouts_bot::telegram::{
    create_bot, default_registries, setup_bot_commands, transport, Dispatcher, HandlerDeps, ReplySink, TelegramSink,
};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (config, logging, database, transport).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
    }));

    match cli.command {
        Some(Commands::Run { webhook }) => run_bot(webhook).await,
        Some(Commands::Migrate) => run_migrate(),
        Some(Commands::HealthCheck { port }) => run_health_check(port).await,
        None => run_bot(false).await,
    }
}

/// Run the Telegram bot until SIGINT/SIGTERM
async fn run_bot(use_webhook: bool) -> Result<()> {
    let config = Config::from_env()?;
    let config = if use_webhook {
        config.with_mode(TransportMode::Push)?
    } else {
        config
    };
    init_logger(&config.log)?;
    log::info!("Starting bot in {} mode...", config.mode);

    let metrics = Arc::new(Metrics::new()?);
    let db_pool = Arc::new(
        create_pool(&config.database_path).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    let bot = create_bot(&config)?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let deps = HandlerDeps::new(Arc::clone(&db_pool), Arc::new(MediaLocator::new(&config.media)));
    let registries = Arc::new(default_registries(&deps)?);
    log::info!(
        "Registered {} menu commands and {} callback domains",
        registries.commands.len(),
        registries.callbacks.len()
    );

    let sink: Arc<dyn ReplySink> = Arc::new(TelegramSink::new(bot.clone()));
    let dispatcher = Dispatcher::new(registries, sink, Arc::clone(&metrics));

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let (events, transport_handle) = transport::start(&config, bot, db_pool, metrics, cancel.clone()).await?;
    log::info!("📡 Ready to receive updates!");

    let outcome = dispatcher.run(events, cancel.clone(), config.shutdown_timeout).await;
    cancel.cancel();

    match tokio::time::timeout(config.shutdown_timeout, transport_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Transport task failed: {}", e),
        Err(_) => log::warn!("Transport did not stop within {:?}", config.shutdown_timeout),
    }

    log::info!("Bot stopped ({:?})", outcome);
    Ok(())
}

/// Apply pending migrations to DATABASE_PATH and exit
fn run_migrate() -> Result<()> {
    init_logger(&LogConfig::default())?;

    let path = env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
    let mut conn = rusqlite::Connection::open(&path)?;
    let applied = run_migrations(&mut conn)?;
    log::info!("Database {} is up to date ({} migrations applied)", path, applied);
    Ok(())
}

/// Probe `/health` of a running listener; a non-OK answer is an error exit.
async fn run_health_check(port: Option<u16>) -> Result<()> {
    let port = match port {
        Some(port) => port,
        None => env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(DEFAULT_PORT),
    };
    let url = format!("http://127.0.0.1:{}/health", port);

    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
    let response = client.get(&url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() && body.trim() == "OK" {
        println!("✅ {} is healthy", url);
        Ok(())
    } else {
        Err(anyhow::anyhow!("Health check failed: {} returned {} {:?}", url, status, body))
    }
}

fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        log::info!("Shutting down gracefully...");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
