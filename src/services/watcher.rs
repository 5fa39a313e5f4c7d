//! The poll loop: fetch the latest status, decide whether it is news, deliver
//! it, sleep, repeat.
//!
//! The watcher owns the `from_date` cursor and the dedup state. A cycle never
//! fails: fetch and parse errors become a failure report that goes through the
//! same dedup as any other report.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::error::DeliveryError;
use crate::services::homework::{HomeworkService, Report};
use crate::services::notifications::{Decision, NotificationState, Notifier};

/// How a single cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Sent,
    Skipped,
    DeliveryFailed(DeliveryError),
}

pub struct StatusWatcher<N: Notifier> {
    homework: HomeworkService,
    notifier: N,
    chat_id: String,
    retry_period: Duration,
    cursor: i64,
    state: NotificationState,
}

impl<N: Notifier> StatusWatcher<N> {
    pub fn new(config: &Config, homework: HomeworkService, notifier: N) -> Self {
        Self {
            homework,
            notifier,
            chat_id: config.telegram.chat_id.clone(),
            retry_period: Duration::from_secs(config.poll.retry_period_seconds),
            cursor: config.poll.start.initial_cursor(),
            state: NotificationState::new(),
        }
    }

    #[cfg(test)]
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    #[cfg(test)]
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    #[cfg(test)]
    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let polled = self.homework.poll(self.cursor).await;
        let report = match &polled {
            Ok(outcome) => outcome.report.clone(),
            Err(e) => {
                tracing::error!("Homework poll failed (from_date={}): {}", self.cursor, e);
                Report::failure(e, self.homework.language())
            }
        };

        let outcome = match self.state.decide(&report) {
            Decision::Skip => {
                tracing::debug!(
                    "Report unchanged since last delivery, skipping: {}",
                    self.state.last_sent().unwrap_or_default()
                );
                CycleOutcome::Skipped
            }
            Decision::Send => {
                match self
                    .notifier
                    .send_notification(&self.chat_id, &report.text)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(kind = ?report.kind, "Notification sent: {}", report.text);
                        self.state = std::mem::take(&mut self.state).delivered(&report.text);
                        CycleOutcome::Sent
                    }
                    Err(e) => {
                        tracing::error!("Failed to deliver notification: {}", e);
                        // The same statuses are requested again next cycle.
                        return CycleOutcome::DeliveryFailed(e);
                    }
                }
            }
        };

        if let Ok(polled) = &polled {
            self.advance_cursor(polled.server_cursor);
        }

        outcome
    }

    fn advance_cursor(&mut self, server_cursor: Option<i64>) {
        match server_cursor {
            Some(next) if next >= self.cursor => {
                tracing::debug!("Cursor advanced from {} to {}", self.cursor, next);
                self.cursor = next;
            }
            Some(next) => {
                tracing::warn!(
                    "Ignoring current_date {} older than cursor {}",
                    next,
                    self.cursor
                );
            }
            None => {
                tracing::debug!("Response has no current_date; cursor stays at {}", self.cursor);
            }
        }
    }

    /// Run cycles until a shutdown signal arrives. The signal is only observed
    /// between cycles.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            "Watching homework statuses every {}s starting from_date={}",
            self.retry_period.as_secs(),
            self.cursor
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Status watcher shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.retry_period) => {}
            }
        }
    }
}
