//! Errors surfaced by the download pipeline.
//!
//! Nothing in the pipeline retries or recovers, so every variant reaches the caller unchanged.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection failure, non-success HTTP status or a body that couldn't be read
    #[error("Failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },

    /// Version list, version label or manifest didn't have the expected shape
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    /// A chunk isn't a valid gzip stream
    #[error("Chunk {chunk_id} is corrupt: {source}")]
    CorruptData {
        chunk_id: u32,
        #[source]
        source: io::Error,
    },

    /// Couldn't create a directory or open/write an output file
    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Download cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn transport(url: impl ToString, reason: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(what: impl ToString, reason: impl ToString) -> Self {
        Self::Parse {
            what: what.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
