use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
