use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request to {url} failed: {failure}")]
    Upstream {
        url: String,
        failure: UpstreamFailure,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error on '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on '{path}'")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error on '{path}'")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Why an outbound request did not produce a usable response.
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),
}

impl Error {
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
