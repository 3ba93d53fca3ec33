use std::sync::Arc;

use serde_json::{Map, Value};
use url::Url;

use crate::{ClientConfig, FilepickerError, HttpRequest, HttpResponse, Transport};

/// Transport and configuration shared by a client and every file it hands
/// out.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    api_url: Url,
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url.as_str())
            .field("storage", &self.config.storage)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session, validating the configured API URL.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, FilepickerError> {
        let api_url = parse_url(&config.api_url)?;
        if api_url.cannot_be_a_base() {
            return Err(FilepickerError::InvalidUrl(config.api_url));
        }

        Ok(Self {
            transport,
            api_url,
            config: Arc::new(config),
        })
    }

    /// Base URL of the API.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `<api_url>/<segments..>`
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, FilepickerError> {
        join(&self.api_url, segments)
    }

    /// Canonical URL of a file handle, `<api_url>/file/<handle>`.
    pub fn file_url(&self, handle: &str) -> Result<Url, FilepickerError> {
        self.endpoint(&["file", handle])
    }

    /// Send a request through the session's transport.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FilepickerError> {
        tracing::debug!(method = %request.method, path = request.url.path(), "Filepicker request");

        let response = self.transport.send(request).await?;

        tracing::debug!(status = %response.status(), "Filepicker response");
        Ok(response)
    }
}

/// Parse an absolute URL.
pub(crate) fn parse_url(url: &str) -> Result<Url, FilepickerError> {
    Url::parse(url).map_err(|_| FilepickerError::InvalidUrl(url.to_string()))
}

/// Append path segments to `url`, keeping its query.
pub(crate) fn join(url: &Url, segments: &[&str]) -> Result<Url, FilepickerError> {
    let mut joined = url.clone();
    joined
        .path_segments_mut()
        .map_err(|_| FilepickerError::InvalidUrl(url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(joined)
}

/// Parse a response body as a JSON object.
pub(crate) fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
