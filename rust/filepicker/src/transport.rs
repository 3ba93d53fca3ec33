//! HTTP transport used by the client.
//!
//! All network access goes through the [`Transport`] trait so that the
//! client and file handles can be driven by [`ReqwestTransport`] in
//! production and by a scripted transport in tests.

use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart;
use thiserror::Error;
use url::Url;

pub use reqwest::{Method, StatusCode};

use crate::ClientConfig;

/// Errors that can occur while performing an HTTP round trip.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Error that occurs when the connection to the API fails
    #[error("Failed to connect to Filepicker API: {0}")]
    ConnectionFailed(String),

    /// Error that occurs when the request does not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error that occurs when a request could not be built or sent
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error that occurs while reading the response body
    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_connect() {
            TransportError::ConnectionFailed(error.to_string())
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(error.to_string())
        } else {
            TransportError::RequestFailed(error.to_string())
        }
    }
}

/// A file sent as a multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type guessed from the file name
    pub mime: String,
    /// File content
    pub content: Bytes,
}

impl FileUpload {
    /// Read a local file, guessing its MIME type from the extension.
    pub async fn from_path(field: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Self {
            field: field.into(),
            mime: guess_mime_type(path),
            file_name,
            content: content.into(),
        })
    }
}

/// Guess the MIME type of a file from its extension.
pub fn guess_mime_type(path: impl AsRef<Path>) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` fields
    Form(Vec<(String, String)>),
    /// `multipart/form-data` with a single file
    Upload(FileUpload),
}

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL, without the parameters in `query`
    pub url: Url,
    /// Query parameters appended to `url`
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
}

impl HttpRequest {
    /// Create a request without parameters or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// A GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// A POST request.
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// A DELETE request.
    pub fn delete(url: Url) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set a query parameter, replacing an earlier value for the same name.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key, value)),
        }
        self
    }

    /// Set several query parameters.
    pub fn with_params<K, V>(self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(self, |request, (k, v)| request.with_query(k, v))
    }

    /// Set the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a form field.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// The URL with all query parameters applied.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

/// Stream of response body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A response whose body has not been read yet.
pub struct HttpResponse {
    status: StatusCode,
    body: BodyStream,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Create a response from a status and a body stream.
    pub fn new(status: StatusCode, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Create a response with a body delivered as a single chunk.
    pub fn from_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self::new(status, Box::pin(futures_util::stream::once(async move {
            Ok::<_, TransportError>(body)
        })))
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The body as a stream of chunks.
    pub fn into_stream(self) -> BodyStream {
        self.body
    }

    /// Read the whole body.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        let mut buffer = BytesMut::new();
        let mut body = self.body;
        while let Some(chunk) = body.try_next().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the body into a [`RawResponse`].
    pub async fn into_raw(self) -> Result<RawResponse, TransportError> {
        let status = self.status;
        let text = self.text().await?;
        Ok(RawResponse { status, text })
    }
}

/// A fully read response that was returned as-is rather than interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Response status
    pub status: StatusCode,
    /// Response body
    pub text: String,
}

impl RawResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Performs HTTP round trips.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response once its headers arrived.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport honoring the timeout and headers of `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut client_builder = reqwest::Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(Duration::from_secs(timeout));
        }

        if !config.headers.is_empty() {
            let mut headers = HeaderMap::new();
            for (name, value) in &config.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
                headers.insert(name, value);
            }
            client_builder = client_builder.default_headers(headers);
        }

        let client = client_builder
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), request.full_url());

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Upload(upload) => {
                let part = multipart::Part::bytes(upload.content.to_vec())
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime)?;
                builder.multipart(multipart::Form::new().part(upload.field, part))
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes_stream().map(|chunk| chunk.map_err(TransportError::from));

        Ok(HttpResponse::new(status, Box::pin(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn it_replaces_repeated_query_parameters() {
        let request = HttpRequest::get(url("https://example.com/api"))
            .with_query("key", "a")
            .with_query("w", "10")
            .with_query("key", "b");

        assert_eq!(
            request.query,
            vec![("key".into(), "b".into()), ("w".into(), "10".into())]
        );
        assert_eq!(request.query_value("key"), Some("b"));
    }

    #[test]
    fn it_builds_full_url() {
        let request = HttpRequest::delete(url("https://example.com/api/file/ZXC"))
            .with_params([("key", "APIKEY"), ("policy", "eyJ9=")]);

        assert_eq!(
            request.full_url().as_str(),
            "https://example.com/api/file/ZXC?key=APIKEY&policy=eyJ9%3D"
        );
    }

    #[test]
    fn it_leaves_url_untouched_without_query() {
        let request = HttpRequest::get(url("https://example.com/api/file/ZXC"));
        assert_eq!(request.full_url().as_str(), "https://example.com/api/file/ZXC");
    }

    #[test]
    fn it_reads_form_fields() {
        let request = HttpRequest::post(url("https://example.com/api/store/S3"))
            .with_body(RequestBody::Form(vec![("url".into(), "a.jpg".into())]));
        assert_eq!(request.form_value("url"), Some("a.jpg"));
        assert_eq!(request.form_value("missing"), None);
    }

    #[test]
    fn it_guesses_mime_types() {
        assert_eq!(guess_mime_type("awesome.jpg"), "image/jpeg");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn it_reads_file_uploads() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("logo.png");
        tokio::fs::write(&path, b"png bytes").await?;

        let upload = FileUpload::from_path("fileUpload", &path).await?;

        assert_eq!(upload.field, "fileUpload");
        assert_eq!(upload.file_name, "logo.png");
        assert_eq!(upload.mime, "image/png");
        assert_eq!(upload.content, Bytes::from_static(b"png bytes"));
        Ok(())
    }

    #[tokio::test]
    async fn it_collects_chunked_bodies() -> anyhow::Result<()> {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let response = HttpResponse::new(StatusCode::OK, Box::pin(futures_util::stream::iter(chunks)));

        let raw = response.into_raw().await?;
        assert!(raw.is_success());
        assert_eq!(raw.text, "hello world");
        Ok(())
    }

    #[tokio::test]
    async fn it_surfaces_connection_failures() -> anyhow::Result<()> {
        let transport = ReqwestTransport::new(&ClientConfig::default().with_timeout(5))?;
        let result = transport
            .send(HttpRequest::get(url("http://127.0.0.1:1/api/file/ZXC")))
            .await;

        assert!(matches!(
            result,
            Err(TransportError::ConnectionFailed(_)) | Err(TransportError::Timeout(_))
        ));
        Ok(())
    }
}
