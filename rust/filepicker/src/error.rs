use filepicker_policy::PolicyError;
use thiserror::Error;

use crate::TransportError;

/// Errors produced by [`Client`](crate::Client) and
/// [`RemoteFile`](crate::RemoteFile) operations.
#[derive(Error, Debug)]
pub enum FilepickerError {
    /// The operation needs an API key and none is set.
    #[error("Please set API key first")]
    MissingApiKey,

    /// Registering or signing a policy failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A URL could not be parsed or carries no file handle.
    #[error("Invalid file url: {0}")]
    InvalidUrl(String),

    /// A JSON response did not describe a file.
    #[error("Invalid file response: {0}")]
    InvalidResponse(String),

    /// The name is neither a metadata attribute nor a file field.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The API was used incorrectly, e.g. a file built without a source.
    #[error("{0}")]
    Usage(String),

    /// The HTTP round trip failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Reading or writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilepickerError {
    /// Whether the operation was refused locally because a credential is
    /// missing (API key or app secret).
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey | Self::Policy(PolicyError::SecretNotSet)
        )
    }
}
