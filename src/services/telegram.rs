use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};

use crate::error::{AppError, AppResult, DeliveryError};
use crate::services::notifications::Notifier;
use async_trait::async_trait;

#[derive(Clone)]
pub struct TelegramService {
    bot: Bot,
}

#[derive(Debug, Clone)]
pub struct TelegramMessage {
    pub chat_id: String,
    pub text: String,
    pub disable_web_page_preview: bool,
}

impl Default for TelegramMessage {
    fn default() -> Self {
        Self {
            chat_id: String::new(),
            text: String::new(),
            disable_web_page_preview: true,
        }
    }
}

/// Accepts numeric chat ids (`42`, `-1001234567890`) and public channel names (`@channel`).
pub fn parse_recipient(chat_id: &str) -> Result<Recipient, DeliveryError> {
    let chat_id = chat_id.trim();
    if let Ok(id) = chat_id.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat_id.len() > 1 && chat_id.starts_with('@') {
        return Ok(Recipient::ChannelUsername(chat_id.to_string()));
    }
    Err(DeliveryError::InvalidChatId(chat_id.to_string()))
}

impl TelegramService {
    pub fn new(token: String) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    /// Talk to a self-hosted Bot API server instead of api.telegram.org.
    pub fn with_api_url(self, api_url: url::Url) -> Self {
        Self {
            bot: self.bot.set_api_url(api_url),
        }
    }

    /// Verify the bot token by getting bot info.
    pub async fn check_identity(&self) -> AppResult<String> {
        match self.bot.get_me().await {
            Ok(me) => {
                tracing::info!("Telegram bot initialized: @{}", me.username());
                Ok(me.username().to_string())
            }
            Err(e) => Err(AppError::Telegram(format!(
                "Failed to initialize bot: {}",
                e
            ))),
        }
    }

    pub async fn send_message(&self, message: TelegramMessage) -> Result<i32, DeliveryError> {
        let recipient = parse_recipient(&message.chat_id)?;

        let request = self
            .bot
            .send_message(recipient, &message.text)
            .disable_web_page_preview(message.disable_web_page_preview);

        match request.await {
            Ok(sent_message) => {
                tracing::debug!(
                    "Telegram message sent to {}: message_id={}",
                    message.chat_id,
                    sent_message.id.0
                );
                Ok(sent_message.id.0)
            }
            Err(e) => Err(DeliveryError::Telegram(format!(
                "Failed to send message: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl Notifier for TelegramService {
    async fn send_notification(&self, chat_id: &str, message: &str) -> Result<(), DeliveryError> {
        self.send_message(TelegramMessage {
            chat_id: chat_id.to_string(),
            text: message.to_string(),
            ..Default::default()
        })
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEND_MESSAGE_PATH: &str = r"(?i)^/bot123:abc/sendmessage$";

    fn service_for(server: &MockServer) -> TelegramService {
        let api_url = url::Url::parse(&server.uri()).unwrap();
        TelegramService::new("123:abc".to_string()).with_api_url(api_url)
    }

    #[test]
    fn numeric_chat_ids_are_accepted() {
        assert!(matches!(parse_recipient("42"), Ok(Recipient::Id(ChatId(42)))));
        assert!(matches!(
            parse_recipient(" -1001234567890 "),
            Ok(Recipient::Id(ChatId(-1001234567890)))
        ));
    }

    #[test]
    fn channel_usernames_are_accepted() {
        match parse_recipient("@homework_feed") {
            Ok(Recipient::ChannelUsername(name)) => assert_eq!(name, "@homework_feed"),
            other => panic!("unexpected recipient: {:?}", other),
        }
    }

    #[test]
    fn garbage_chat_ids_are_rejected() {
        assert_eq!(
            parse_recipient("chat"),
            Err(DeliveryError::InvalidChatId("chat".to_string()))
        );
        assert!(parse_recipient("@").is_err());
    }

    #[tokio::test]
    async fn send_message_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(SEND_MESSAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {
                    "message_id": 7,
                    "date": 1567927221,
                    "chat": {"id": 42, "first_name": "A", "type": "private"},
                    "from": {"id": 42, "is_bot": true, "first_name": "Bot"},
                    "text": "hello"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sent = service_for(&server)
            .send_message(TelegramMessage {
                chat_id: "42".to_string(),
                text: "hello".to_string(),
                ..Default::default()
            })
            .await;

        assert_eq!(sent, Ok(7));
    }

    #[tokio::test]
    async fn rejected_send_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(SEND_MESSAGE_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let result = service_for(&server)
            .send_notification("42", "hello")
            .await;

        match result {
            Err(DeliveryError::Telegram(msg)) => {
                assert!(msg.starts_with("Failed to send message"), "{}", msg)
            }
            other => panic!("expected a Telegram delivery error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invalid_chat_id_never_reaches_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = service_for(&server).send_notification("chat", "hello").await;

        assert_eq!(result, Err(DeliveryError::InvalidChatId("chat".to_string())));
    }
}
