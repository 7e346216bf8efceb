use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Lookup for \"{word}\" returned HTTP {status}")]
    HttpStatus { word: String, status: u16 },

    #[error("Lookup for \"{word}\" timed out after {after:?}")]
    Timeout { word: String, after: Duration },

    #[error("Unsupported word list format: {0}")]
    UnsupportedFormat(String),

    #[error("No words to process in {0}")]
    EmptyWordList(PathBuf),

    #[error("Invalid crawl configuration: {0}")]
    InvalidConfig(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    /// Errors raised while talking to the lookup endpoint. These are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::HttpStatus { .. }
                | Error::Timeout { .. }
                | Error::Reqwest(_)
                | Error::Json(_)
        )
    }
}
