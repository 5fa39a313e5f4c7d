//! Initialization helpers for the application:
//! - construction of the homework API client and the Telegram bot
//! - background worker spawn helpers
//!
//! This module keeps `main.rs` down to logging, configuration and shutdown.

use crate::config::Config;
use crate::error::AppResult;
use crate::services::homework::HomeworkService;
use crate::services::telegram::TelegramService;
use crate::services::watcher::StatusWatcher;

/// Hide most of a secret before it is logged.
///
/// Keeps the first four characters of long secrets so operators can tell
/// tokens apart; short secrets are hidden entirely.
pub fn redact_secret(secret: &str) -> String {
    if secret.chars().count() <= 8 {
        return "(redacted)".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}…(redacted)", prefix)
}

/// Build the services the watcher depends on.
///
/// The Telegram bot identity is checked with `getMe`; a failure is only logged
/// because delivery errors are retried every cycle anyway.
pub async fn initialize_services(config: &Config) -> AppResult<(HomeworkService, TelegramService)> {
    tracing::info!(
        "Using homework API {} with token {}",
        config.homework_api.url,
        redact_secret(&config.homework_api.token)
    );
    let homework = HomeworkService::new(config)?;

    tracing::info!(
        "Initializing Telegram bot with token {}",
        redact_secret(&config.telegram.bot_token)
    );
    let mut telegram = TelegramService::new(config.telegram.bot_token.clone());
    if let Some(api_url) = &config.telegram.api_url {
        tracing::info!("Using Telegram Bot API server {}", api_url);
        telegram = telegram.with_api_url(api_url.clone());
    }
    if let Err(e) = telegram.check_identity().await {
        tracing::warn!("Telegram bot check failed: {}", e);
    }

    Ok((homework, telegram))
}

/// Spawn the status watcher.
///
/// The returned `JoinHandle` lets callers await the worker after sending the
/// shutdown notification through `shutdown`.
pub fn spawn_status_watcher(
    config: &Config,
    homework: HomeworkService,
    telegram: TelegramService,
    shutdown: &tokio::sync::broadcast::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    let watcher = StatusWatcher::new(config, homework, telegram);
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(watcher.run(shutdown_rx))
}
