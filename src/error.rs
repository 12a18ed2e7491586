use std::path::PathBuf;

use crate::actor::ActorLabel;

/// Everything that can go wrong while running a simulation
///
/// None of these are retried; the caller decides whether to abort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open log file {path}: {source}")]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to log: {0}")]
    WriteLog(#[from] std::io::Error),

    #[error("log sink is already closed")]
    LogClosed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn thread for {label}: {source}")]
    Spawn {
        label: ActorLabel,
        #[source]
        source: std::io::Error,
    },

    /// The actor returned an error from its loop
    #[error("{label} failed: {source}")]
    ActorError {
        label: ActorLabel,
        #[source]
        source: Box<Error>,
    },

    /// The actor panicked
    #[error("{label} failed: {reason}")]
    ActorFailed { label: ActorLabel, reason: String },

    #[error("malformed log line: {0}")]
    ParseLine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
