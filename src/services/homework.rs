use std::fmt::Display;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::{error_chain, AppResult, FetchError, ParseError, PollError, ValidationError};
use crate::i18n;

/// Longest homework name copied into a report, in characters.
pub const MAX_NAME_CHARS: usize = 256;
/// Longest unrecognized status echoed back in a failure report.
pub const MAX_STATUS_CHARS: usize = 64;
/// Longest error description in a failure report.
pub const MAX_DETAIL_CHARS: usize = 512;

/// Client for the homework review API.
#[derive(Clone)]
pub struct HomeworkService {
    client: Client,
    url: String,
    token: String,
    language: String,
}

// ============================================================================
// Submission Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
    /// A status string the bot has no verdict for.
    Unknown(String),
}

impl HomeworkStatus {
    pub fn from_api(raw: &str) -> Self {
        match raw {
            "approved" => HomeworkStatus::Approved,
            "reviewing" => HomeworkStatus::Reviewing,
            "rejected" => HomeworkStatus::Rejected,
            other => HomeworkStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
            HomeworkStatus::Unknown(raw) => raw,
        }
    }

    /// Translation key of the verdict text, `None` for unknown statuses.
    pub fn verdict_key(&self) -> Option<&'static str> {
        match self {
            HomeworkStatus::Approved => Some("verdict.approved"),
            HomeworkStatus::Reviewing => Some("verdict.reviewing"),
            HomeworkStatus::Rejected => Some("verdict.rejected"),
            HomeworkStatus::Unknown(_) => None,
        }
    }
}

/// Cut `s` to at most `max` characters, marking the cut with an ellipsis.
///
/// Values from the API are copied into chat messages, and Telegram refuses
/// texts longer than 4096 characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub status: HomeworkStatus,
}

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Status,
    NoNewStatus,
    Failure,
}

/// The text produced by one poll cycle, as it would be sent to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub kind: ReportKind,
    pub text: String,
}

impl Report {
    pub fn status(submission: &Submission, lang: &str) -> Result<Self, ParseError> {
        let verdict_key = submission
            .status
            .verdict_key()
            .ok_or_else(|| {
                ParseError::UnknownStatus(truncate_chars(
                    submission.status.as_str(),
                    MAX_STATUS_CHARS,
                ))
            })?;
        let verdict = i18n::tr(Some(lang), verdict_key, None);
        let name = truncate_chars(&submission.name, MAX_NAME_CHARS);

        Ok(Self {
            kind: ReportKind::Status,
            text: i18n::tr(
                Some(lang),
                "report.status_changed",
                Some(&[
                    ("verdict", verdict.as_str()),
                    ("homework", name.as_str()),
                ]),
            ),
        })
    }

    pub fn no_new_status(lang: &str) -> Self {
        Self {
            kind: ReportKind::NoNewStatus,
            text: i18n::tr(Some(lang), "report.no_new_status", None),
        }
    }

    pub fn failure(detail: &impl Display, lang: &str) -> Self {
        let detail = truncate_chars(&detail.to_string(), MAX_DETAIL_CHARS);
        Self {
            kind: ReportKind::Failure,
            text: i18n::tr(Some(lang), "report.failure", Some(&[("error", detail.as_str())])),
        }
    }
}

/// Result of a successful poll: the report and the cursor the server suggests
/// for the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub report: Report,
    pub server_cursor: Option<i64>,
}

// ============================================================================
// Response parsing
// ============================================================================

/// Check the response envelope and return the `homeworks` list.
pub fn validate_response(raw: &Value) -> Result<&[Value], ValidationError> {
    let map = raw.as_object().ok_or(ValidationError::NotAMapping)?;
    let homeworks = map
        .get("homeworks")
        .ok_or(ValidationError::MissingField("homeworks"))?;

    homeworks
        .as_array()
        .map(|list| list.as_slice())
        .ok_or(ValidationError::WrongType {
            field: "homeworks",
            expected: "an array",
        })
}

pub fn parse_submission(value: &Value) -> Result<Submission, ParseError> {
    let entry = value.as_object().ok_or(ParseError::NotAMapping)?;

    let name = entry
        .get("homework_name")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingKey("homework_name"))?;
    let status = entry
        .get("status")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingKey("status"))?;

    Ok(Submission {
        name: name.to_string(),
        status: HomeworkStatus::from_api(status),
    })
}

/// Render the report for the most recent submission (the first entry).
pub fn extract_report(submissions: &[Value], lang: &str) -> Result<Report, ParseError> {
    let Some(latest) = submissions.first() else {
        tracing::debug!("No new homework statuses in the response");
        return Ok(Report::no_new_status(lang));
    };

    let submission = parse_submission(latest)?;
    Report::status(&submission, lang)
}

pub fn server_cursor(raw: &Value) -> Option<i64> {
    raw.get("current_date").and_then(Value::as_i64)
}

impl HomeworkService {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.homework_api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.homework_api.url.clone(),
            token: config.homework_api.token.clone(),
            language: config.language.clone(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Issue a single request for statuses changed since `cursor`.
    pub async fn fetch_status(&self, cursor: i64) -> Result<Value, FetchError> {
        tracing::debug!("Requesting homework statuses from_date={}", cursor);

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", cursor)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "Homework API request failed (from_date={}): {}",
                    cursor,
                    error_chain(&e)
                );
                FetchError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Homework API returned {} (from_date={}): {}",
                status,
                cursor,
                body
            );
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::error!(
                "Failed to read homework API response (from_date={}): {}",
                cursor,
                error_chain(&e)
            );
            FetchError::from(e)
        })?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    pub async fn poll(&self, cursor: i64) -> Result<PollOutcome, PollError> {
        let raw = self.fetch_status(cursor).await?;
        let submissions = validate_response(&raw)?;
        let report = extract_report(submissions, &self.language)?;

        Ok(PollOutcome {
            report,
            server_cursor: server_cursor(&raw),
        })
    }
}
