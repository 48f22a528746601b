use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the service layer.
///
/// `Display` renders exactly the message a user should see, so callers can
/// forward `err.to_string()` to an alert or banner unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    NotAuthenticated,
    /// Non-2xx response. `message` comes from the backend envelope when one
    /// was present, otherwise from the operation's fallback text.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotAuthenticated => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) | Self::InvalidRequest(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
