use std::path::PathBuf;

use crate::{RawResponse, RemoteFile, StatusCode};

/// Result of a call that stores a file (store, overwrite).
#[derive(Debug, Clone)]
pub enum Stored {
    /// The server described the stored file.
    File(RemoteFile),
    /// The server answered with something other than a file description.
    Unparsed(RawResponse),
}

impl Stored {
    /// The stored file, if the response described one.
    pub fn file(self) -> Option<RemoteFile> {
        match self {
            Self::File(file) => Some(file),
            Self::Unparsed(_) => None,
        }
    }
}

/// Result of [`RemoteFile::convert`].
#[derive(Debug, Clone)]
pub enum Conversion {
    /// A temporary file describing the converted view; nothing was stored.
    Preview(RemoteFile),
    /// The converted file was stored and described by the server.
    Stored(RemoteFile),
    /// The convert-and-store call answered with something other than a file
    /// description.
    Unparsed(RawResponse),
    /// The file is itself a conversion preview and cannot be converted again.
    AlreadyConverted,
}

impl Conversion {
    /// The resulting file, if any.
    pub fn file(self) -> Option<RemoteFile> {
        match self {
            Self::Preview(file) | Self::Stored(file) => Some(file),
            Self::Unparsed(_) | Self::AlreadyConverted => None,
        }
    }
}

/// Result of [`RemoteFile::download`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Download {
    /// Response status
    pub status: StatusCode,
    /// Bytes written to the destination
    pub bytes_written: u64,
}

impl Download {
    /// Whether the content was downloaded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// New content for [`RemoteFile::overwrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteSource {
    /// Content fetched by the service from a URL.
    Url(String),
    /// Content uploaded from a local file.
    Path(PathBuf),
}
