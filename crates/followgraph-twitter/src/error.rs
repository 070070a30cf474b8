use followgraph_core::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwitterError>;

#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limit still exhausted after {waits} waits")]
    RateLimited { waits: u32 },

    #[error("Credentials error: {0}")]
    Credentials(String),
}

impl TwitterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TwitterError::Api { status: 404, .. })
    }
}

impl From<reqwest::Error> for TwitterError {
    fn from(err: reqwest::Error) -> Self {
        TwitterError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TwitterError {
    fn from(err: serde_json::Error) -> Self {
        TwitterError::Parse(err.to_string())
    }
}

impl From<TwitterError> for SourceError {
    fn from(err: TwitterError) -> Self {
        match err {
            TwitterError::Network(message) => SourceError::Unavailable(message),
            TwitterError::Api { status, message } => SourceError::Remote { status, message },
            TwitterError::Parse(message) => SourceError::Malformed(message),
            TwitterError::Credentials(message) => SourceError::Unavailable(message),
            TwitterError::RateLimited { waits } => SourceError::Remote {
                status: 429,
                message: format!("rate limit still exhausted after {waits} waits"),
            },
        }
    }
}
