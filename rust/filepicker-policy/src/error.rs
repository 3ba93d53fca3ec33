use thiserror::Error;

/// Errors that can occur while building, registering or signing policies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A policy was registered on an owner that has no application secret.
    #[error("Please set app secret first")]
    SecretNotSet,

    /// An empty application secret was supplied.
    #[error("App secret must not be empty")]
    EmptySecret,

    /// No policy is registered under the requested name.
    #[error("No policy named '{0}'")]
    UnknownPolicy(String),

    /// The policy could not be serialized to JSON.
    #[error("Failed to serialize policy: {0}")]
    Serialization(String),

    /// An encoded policy could not be decoded back into a mapping.
    #[error("Failed to decode policy: {0}")]
    Decode(String),
}
