use std::io;
use thiserror::Error as ThisError;

/// Enum for errors surfaced by navigation and transfer operations
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// A remote path segment does not exist and creation was not requested
    #[error("not found: {0}")]
    NotFound(String),
    /// The server rejected a directory creation request
    #[error("cannot create directory {0}: {1}")]
    Creation(String, String),
    /// Failure reported by the underlying control connection
    #[error("transport: {0}")]
    Transport(String),
    /// Any errors related to I/O
    #[error("I/O: {0}")]
    IO(String),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

pub type FtpResult<T> = Result<T, Error>;
