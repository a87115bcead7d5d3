use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    /// An input directory is missing or unreadable.
    #[error("cannot read directory '{}': {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A timing line or metadata value could not be interpreted.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A timing file name does not follow `{prefix}-{book_number}-{book_name}-{chapter}`.
    #[error("unexpected timing file name '{name}': {message}")]
    FileName { name: String, message: String },

    /// The external trim tool exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Extraction {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` did not finish within {after:?}")]
    Timeout { command: String, after: Duration },

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should stop the whole run rather than a single timing file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Discovery { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
