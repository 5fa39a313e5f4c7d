use std::env;

pub const DEFAULT_HOMEWORK_API_URL: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Clone)]
pub struct Config {
    pub homework_api: HomeworkApiConfig,
    pub telegram: TelegramConfig,
    pub poll: PollConfig,
    /// Language of the messages sent to the chat ("en" or "ru").
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct HomeworkApiConfig {
    pub url: String,
    pub token: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API server override; the public Telegram server when absent.
    pub api_url: Option<url::Url>,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Pause between two poll cycles.
    pub retry_period_seconds: u64,
    /// Where the `from_date` cursor starts on a fresh process.
    pub start: PollStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStart {
    /// Only statuses changed after the bot was started are reported.
    Now,
    /// The whole history is requested on the first cycle.
    Zero,
}

impl PollStart {
    pub fn initial_cursor(&self) -> i64 {
        match self {
            PollStart::Now => chrono::Utc::now().timestamp(),
            PollStart::Zero => 0,
        }
    }
}

impl Config {
    /// Read the process environment. `.env` is loaded by `main` beforehand.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Credentials are required and must not be blank. Optional values fall
    /// back to defaults when absent but are rejected when present and malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(ConfigError::MissingEnv(key.to_string())),
            }
        };

        let positive = |key: &str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(v) => match v.trim().parse::<u64>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(ConfigError::InvalidValue(key.to_string())),
                },
            }
        };

        let url = lookup("HOMEWORK_API_URL")
            .unwrap_or_else(|| DEFAULT_HOMEWORK_API_URL.to_string());
        url::Url::parse(&url)
            .map_err(|_| ConfigError::InvalidValue("HOMEWORK_API_URL".to_string()))?;

        let telegram_api_url = match lookup("TELEGRAM_API_URL") {
            Some(v) if !v.trim().is_empty() => Some(
                url::Url::parse(v.trim())
                    .map_err(|_| ConfigError::InvalidValue("TELEGRAM_API_URL".to_string()))?,
            ),
            _ => None,
        };

        let start = match lookup("POLL_START") {
            None => PollStart::Now,
            Some(v) => match v.trim().to_lowercase().as_str() {
                "now" => PollStart::Now,
                "zero" | "0" => PollStart::Zero,
                _ => return Err(ConfigError::InvalidValue("POLL_START".to_string())),
            },
        };

        let language = crate::i18n::normalize_language(
            &lookup("BOT_LANGUAGE").unwrap_or_else(|| crate::i18n::DEFAULT_LANG.to_string()),
        );
        if !crate::i18n::is_supported_language(&language) {
            return Err(ConfigError::InvalidValue("BOT_LANGUAGE".to_string()));
        }

        Ok(Config {
            homework_api: HomeworkApiConfig {
                url,
                token: required("PRACTICUM_TOKEN")?,
                timeout_seconds: positive("HOMEWORK_API_TIMEOUT_SECONDS", 30)?,
            },
            telegram: TelegramConfig {
                bot_token: required("TELEGRAM_TOKEN")?,
                chat_id: required("TELEGRAM_CHAT_ID")?,
                api_url: telegram_api_url,
            },
            poll: PollConfig {
                retry_period_seconds: positive("RETRY_PERIOD_SECONDS", 600)?,
                start,
            },
            language,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            homework_api: HomeworkApiConfig {
                url: DEFAULT_HOMEWORK_API_URL.to_string(),
                token: String::new(),
                timeout_seconds: 30,
            },
            telegram: TelegramConfig {
                bot_token: String::new(),
                chat_id: String::new(),
                api_url: None,
            },
            poll: PollConfig {
                retry_period_seconds: 600,
                start: PollStart::Now,
            },
            language: crate::i18n::DEFAULT_LANG.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("PRACTICUM_TOKEN", "practicum"),
        ("TELEGRAM_TOKEN", "123:abc"),
        ("TELEGRAM_CHAT_ID", "42"),
    ];

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = Config::from_lookup(lookup_from(&CREDENTIALS)).unwrap();
        assert_eq!(config.homework_api.url, DEFAULT_HOMEWORK_API_URL);
        assert_eq!(config.homework_api.token, "practicum");
        assert_eq!(config.homework_api.timeout_seconds, 30);
        assert_eq!(config.telegram.chat_id, "42");
        assert_eq!(config.telegram.api_url, None);
        assert_eq!(config.poll.retry_period_seconds, 600);
        assert_eq!(config.poll.start, PollStart::Now);
        assert_eq!(config.language, "en");
    }

    #[test]
    fn each_missing_credential_is_reported() {
        for missing in ["PRACTICUM_TOKEN", "TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"] {
            let pairs: Vec<(&str, &str)> = CREDENTIALS
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            match Config::from_lookup(lookup_from(&pairs)) {
                Err(ConfigError::MissingEnv(key)) => assert_eq!(key, missing),
                other => panic!("expected MissingEnv({}), got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let config = Config::from_lookup(lookup_from(&[
            ("PRACTICUM_TOKEN", "   "),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]));
        assert!(matches!(config, Err(ConfigError::MissingEnv(k)) if k == "PRACTICUM_TOKEN"));
    }

    #[test]
    fn retry_period_override_must_be_positive() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("RETRY_PERIOD_SECONDS", "0"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::InvalidValue(k)) if k == "RETRY_PERIOD_SECONDS"
        ));

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("RETRY_PERIOD_SECONDS", "120"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.poll.retry_period_seconds, 120);
    }

    #[test]
    fn poll_start_and_language_are_parsed() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("POLL_START", "zero"));
        pairs.push(("BOT_LANGUAGE", "ru-RU"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.poll.start, PollStart::Zero);
        assert_eq!(config.poll.start.initial_cursor(), 0);
        assert_eq!(config.language, "ru");

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("POLL_START", "yesterday"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn malformed_endpoint_is_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("HOMEWORK_API_URL", "not a url"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::InvalidValue(k)) if k == "HOMEWORK_API_URL"
        ));
    }

    #[test]
    fn telegram_api_url_override_is_validated() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("TELEGRAM_API_URL", "http://127.0.0.1:8081"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(
            config.telegram.api_url.as_ref().map(|u| u.as_str()),
            Some("http://127.0.0.1:8081/")
        );

        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("TELEGRAM_API_URL", "bot api"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::InvalidValue(k)) if k == "TELEGRAM_API_URL"
        ));
    }
}
