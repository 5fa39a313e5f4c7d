use std::error::Error as StdError;
use std::io::ErrorKind;

/// Failure to obtain a response body from the homework API.
///
/// Display texts end up in chat messages, so they must be identical for
/// identical failures: no URLs, no response bodies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Homework API request failed: {0}")]
    Transport(String),

    #[error("Homework API returned status {code} {reason}")]
    BadStatus {
        code: u16,
        reason: String,
        body: String,
    },

    #[error("Homework API response is not valid JSON: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(classify_transport(&e).to_string())
    }
}

/// Short, stable description of a transport failure.
///
/// reqwest's own message is "error sending request" for most failures; the
/// actual cause sits further down the source chain.
pub fn classify_transport(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        return "request timed out";
    }

    let mut source = e.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                ErrorKind::ConnectionRefused => return "connection refused",
                ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                    return "connection reset"
                }
                ErrorKind::TimedOut => return "request timed out",
                _ => {}
            }
        }
        if cause.to_string().to_lowercase().contains("dns error") {
            return "DNS lookup failed";
        }
        source = cause.source();
    }

    if e.is_connect() {
        "connection failed"
    } else if e.is_body() || e.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    }
}

/// Render an error with all of its sources, outermost first.
pub fn error_chain(e: &(dyn StdError + 'static)) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// The response body does not have the expected envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("API response is not a JSON object")]
    NotAMapping,

    #[error("API response has no `{0}` field")]
    MissingField(&'static str),

    #[error("API response field `{field}` is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A homework entry could not be turned into a report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("homework entry is not a JSON object")]
    NotAMapping,

    #[error("homework entry has no `{0}` field")]
    MissingKey(&'static str),

    #[error("unexpected homework status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid chat_id: {0}")]
    InvalidChatId(String),

    #[error("Telegram error: {0}")]
    Telegram(String),
}

/// Everything that can go wrong within one poll of the homework API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Startup failures after the configuration has been loaded.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Telegram error: {0}")]
    Telegram(String),
}

pub type AppResult<T> = Result<T, AppError>;
