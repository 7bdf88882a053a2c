//! Error type shared by every engine entry point.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required text was absent (as opposed to empty).
    #[error("null input: {0}")]
    InvalidInput(&'static str),
    #[error("pattern too long: {len} chars exceeds the {max}-bit match limit")]
    PatternTooLong { len: usize, max: usize },
    #[error("unknown call format to patch make")]
    UnknownCallFormat,
    #[error("invalid delta: {0}")]
    InvalidDelta(String),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
