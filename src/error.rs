use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tzkt returned status {status} for offset {offset}")]
    UnexpectedStatus { status: u16, offset: usize },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("delegation {id} has invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        id: i64,
        value: String,
        source: chrono::ParseError,
    },

    #[error("delegation {id} is invalid: {reason}")]
    InvalidRecord { id: i64, reason: String },

    #[error("no end of data after {pages} pages")]
    PageLimitExceeded { pages: usize },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    #[error("sync did not finish within {0:?}")]
    Timeout(Duration),
}

pub type IndexerResult<T> = Result<T, IndexerError>;
