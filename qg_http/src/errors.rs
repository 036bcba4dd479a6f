use qg_pacer::PacerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Pacer(#[from] PacerError),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Request body cannot be replayed after a rejection")]
    UnreplayableRequest,

    #[error("Still rejected with 429 after {attempts} attempts")]
    Rejected { attempts: u32 },

    #[error("API error: HTTP {status} - {body}")]
    ApiError { status: u16, body: String },
}

impl HttpError {
    /// The quota error raised by a fail-fast pacer, if that is what this is
    pub fn as_quota_exhausted(&self) -> Option<&PacerError> {
        match self {
            HttpError::Pacer(err) if err.is_quota_exhausted() => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
