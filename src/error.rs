//! Per-request error classification
//!
//! Filesystem failures while resolving a request are folded into three
//! outcomes, each with a fixed status code and body.

use hyper::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    /// Missing path, a path through a non-directory, or a path outside the root
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    Forbidden,

    #[error("i/o error: {0}")]
    Io(#[source] io::Error),
}

impl ServeError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body sent to the client
    pub const fn body(&self) -> &'static str {
        match self {
            Self::NotFound => "404 page not found\n",
            Self::Forbidden => "403 Forbidden\n",
            Self::Io(_) => "500 Internal Server Error\n",
        }
    }
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
                Self::NotFound
            }
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            _ => Self::Io(err),
        }
    }
}
