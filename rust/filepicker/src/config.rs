use filepicker_policy::Secret;

use crate::FilepickerError;

/// Base URL of the Filepicker REST API.
pub const DEFAULT_API_URL: &str = "https://www.filepicker.io/api";

/// Storage backend used when a store call does not name one.
pub const DEFAULT_STORAGE: &str = "S3";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "FILEPICKER_API_KEY";

/// Environment variable holding the app secret.
pub const APP_SECRET_VAR: &str = "FILEPICKER_APP_SECRET";

/// Configuration for a [`Client`](crate::Client).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL for the REST API (e.g. "https://www.filepicker.io/api")
    pub api_url: String,

    /// Default storage backend for store calls (e.g. "S3", "azure")
    pub storage: String,

    /// Optional timeout for requests in seconds (default: 30)
    pub timeout_seconds: Option<u64>,

    /// Optional custom headers to send with each request
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage: DEFAULT_STORAGE.to_string(),
            timeout_seconds: Some(30),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration pointing at the given API base URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Set the API base URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the default storage backend
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Disable the request timeout
    pub fn without_timeout(mut self) -> Self {
        self.timeout_seconds = None;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// API key and app secret of a client or file.
///
/// The API key is sent as the `key` parameter. The secret is only used to
/// sign policies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    api_key: Option<String>,
    secret: Option<Secret>,
}

impl Credentials {
    /// Empty credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read credentials from `FILEPICKER_API_KEY` and `FILEPICKER_APP_SECRET`.
    ///
    /// Unset variables leave the corresponding credential empty.
    pub fn from_env() -> Result<Self, FilepickerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, keyed by the same variable names
    /// as [`Credentials::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FilepickerError> {
        let mut credentials = Self::new();
        if let Some(api_key) = lookup(API_KEY_VAR) {
            credentials.set_api_key(api_key);
        }
        if let Some(secret) = lookup(APP_SECRET_VAR) {
            credentials.set_secret(Secret::new(secret)?);
        }
        Ok(credentials)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.set_api_key(api_key);
        self
    }

    /// Set the app secret.
    pub fn with_secret(mut self, secret: Secret) -> Self {
        self.set_secret(secret);
        self
    }

    /// Set the API key.
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    /// Set the app secret.
    pub fn set_secret(&mut self, secret: Secret) {
        self.secret = Some(secret);
    }

    /// Forget the API key.
    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    /// The API key, if set.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The app secret, if set.
    pub fn secret(&self) -> Option<&Secret> {
        self.secret.as_ref()
    }

    /// The API key, or [`FilepickerError::MissingApiKey`].
    pub fn require_api_key(&self) -> Result<&str, FilepickerError> {
        self.api_key().ok_or(FilepickerError::MissingApiKey)
    }
}
