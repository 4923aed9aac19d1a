use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited (HTTP 429): {0}")]
    RateLimited(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True when the failure looks like upstream throttling.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited(_) => true,
            Error::Http(e) => e.status().map_or(false, |s| s.as_u16() == 429),
            other => other.to_string().contains("429"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
