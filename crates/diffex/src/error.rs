use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] diffex_core::Error),
    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),
    #[error("invalid placeholder pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("{0}")]
    Io(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
