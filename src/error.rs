use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("No appointment with id {0}")]
    NotFound(Uuid),

    #[error("Position {index} is out of range, agenda holds {len} appointments")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("'{0}' is neither an appointment id nor a position")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures reading or writing one of the JSON files on disk.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type AgendaResult<T> = Result<T, AgendaError>;
