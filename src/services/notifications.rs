use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::services::homework::Report;

/// Delivery channel for rendered reports.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send_notification(&self, chat_id: &str, message: &str) -> Result<(), DeliveryError>;
}

/// What to do with the report of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Send,
    Skip,
}

/// Dedup state: the last report text that reached the chat.
///
/// Only a confirmed delivery produces a new state, so a report whose delivery
/// failed is still considered new on the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    last_sent: Option<String>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn decide(&self, report: &Report) -> Decision {
        if self.last_sent.as_deref() == Some(report.text.as_str()) {
            Decision::Skip
        } else {
            Decision::Send
        }
    }

    pub fn delivered(self, text: &str) -> Self {
        Self {
            last_sent: Some(text.to_string()),
        }
    }
}
