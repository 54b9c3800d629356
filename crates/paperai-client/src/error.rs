use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error [{status}]: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// The `message` field of the backend's error body, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message: Some(m), .. } if !m.trim().is_empty() => Some(m),
            _ => None,
        }
    }

    /// Server message, else the supplied fallback.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.server_message().unwrap_or(fallback)
    }

    /// Server message, else a description of what went wrong locally.
    pub fn describe(&self) -> String {
        match self.server_message() {
            Some(m) => m.to_string(),
            None => match self {
                ApiError::Transport(e) => e.to_string(),
                ApiError::Rejected { status, .. } => {
                    format!("Request failed with status code {status}")
                }
                ApiError::Decode(detail) => detail.clone(),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extracts `{message}` from an error body. Non-JSON bodies yield `None`.
pub(crate) fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
}
