use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Shared medium {path} is unavailable: {source}")]
    MediumUnavailable {
        path: PathBuf,
        #[source]
        source: MediumError,
    },
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error("No server id was supplied to the joining side")]
    MissingServerId,
    #[error("Interactive input was closed before a valid id was entered")]
    InputClosed,
    #[error("Peer did not appear within {waited:?}")]
    Timeout { waited: Duration },
    #[error("Exchange was cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Low-level failure of the shared medium itself.
#[derive(Error, Debug)]
pub enum MediumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parsing error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ExchangeError {
    pub(crate) fn medium(
        path: impl Into<PathBuf>,
        source: impl Into<MediumError>,
    ) -> Self {
        Self::MediumUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether the error means the peer never showed up, as opposed to
    /// something being broken.
    pub fn is_wait_aborted(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
