use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod i18n;
mod services;

use config::Config;
use services::init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG / LOG_FORMAT from it are honoured
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "homework_bot=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration; missing credentials are fatal
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Cannot start: {}", e);
        e
    })?;

    tracing::info!("Starting homework status bot");

    let (homework, telegram) = init::initialize_services(&config).await?;

    let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    let mut watcher = init::spawn_status_watcher(&config, homework, telegram, &shutdown_tx);

    tokio::select! {
        res = &mut watcher => {
            // The loop has no exit of its own; getting here means it panicked.
            if let Err(e) = res {
                tracing::error!("Status watcher stopped unexpectedly: {}", e);
                return Err(e.into());
            }
            return Ok(());
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, notifying the status watcher");
            let _ = shutdown_tx.send(());
        }
    }

    let shutdown_wait = Duration::from_secs(15);
    tracing::info!(
        "Waiting up to {}s for the status watcher to exit",
        shutdown_wait.as_secs()
    );
    if tokio::time::timeout(shutdown_wait, watcher).await.is_err() {
        tracing::warn!("Status watcher did not exit in time");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to bind SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
