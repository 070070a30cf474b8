use thiserror::Error;

/// Failures reported by an account source.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Account not found: {screen_name}")]
    NotFound { screen_name: String },

    #[error("Account service unavailable: {0}")]
    Unavailable(String),

    #[error("Account service error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Malformed account service response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}
