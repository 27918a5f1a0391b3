//! Logger initialization
//!
//! Terminal output is always on; a file sink is added when `LOG_FILE_PATH`
//! is configured.

use std::fs::OpenOptions;

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use crate::core::config::LogConfig;

/// Initialize the global logger from the log section of the config.
///
/// Fails if the log file cannot be opened or a logger is already installed.
pub fn init_logger(config: &LogConfig) -> Result<()> {
    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        config.level,
        log_config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = &config.file_path {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path, e))?;
        loggers.push(WriteLogger::new(config.level, log_config, log_file));
    }

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;
    use tempfile::TempDir;

    #[test]
    fn test_init_logger_creates_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot.log");
        let config = LogConfig {
            level: LevelFilter::Debug,
            file_path: Some(path.to_string_lossy().into_owned()),
        };

        // A logger may already be installed by another test in this binary;
        // the file is opened before installation either way.
        let _ = init_logger(&config);

        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_log_path_fails() {
        let config = LogConfig {
            level: LevelFilter::Info,
            file_path: Some("/nonexistent-dir/for-sure/bot.log".to_string()),
        };
        assert!(init_logger(&config).is_err());
    }
}
