use reqwest::StatusCode;
use shared::error::ApiErrorBody;
use thiserror::Error;

use crate::validation::ValidationErrors;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The access token could not be renewed. Stored tokens have been cleared
    /// and the user has to sign in again.
    #[error("session expired; sign in again")]
    SessionExpired,
    #[error("server returned {status}: {}", describe_body(.body))]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("token storage failure: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// Backend-provided explanation for a failed request, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Status { body, .. } => ApiErrorBody::parse(body).map(|body| body.message()),
            _ => None,
        }
    }
}

fn describe_body(body: &str) -> String {
    match ApiErrorBody::parse(body) {
        Some(parsed) => parsed.message(),
        None if body.trim().is_empty() => "<empty body>".to_string(),
        None => body.chars().take(200).collect(),
    }
}
