//! Scripted in-memory [`Transport`] for tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{HttpRequest, HttpResponse, StatusCode, Transport, TransportError};

/// A canned response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    status: StatusCode,
    chunks: Vec<Bytes>,
}

impl MockResponse {
    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::status(StatusCode::OK, body)
    }

    /// `200 OK` with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        Self::ok(value.to_string())
    }

    /// Response with the given status and body.
    pub fn status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::chunked(status, [body.into()])
    }

    /// Response whose body arrives in the given chunks.
    pub fn chunked(status: StatusCode, chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            status,
            chunks: chunks.into_iter().collect(),
        }
    }

    fn into_response(self) -> HttpResponse {
        let chunks = self.chunks.into_iter().map(Ok::<_, TransportError>);
        HttpResponse::new(self.status, Box::pin(futures_util::stream::iter(chunks)))
    }
}

type Handler = Box<dyn Fn(&HttpRequest) -> Result<MockResponse, TransportError> + Send + Sync>;

/// A [`Transport`] that answers from a handler and records every request.
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.requests.lock().len())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    /// Answer each request with the handler's response.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<MockResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same response.
    pub fn respond(response: MockResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Answer every request with `200 OK` and the given text.
    pub fn json(body: &str) -> Self {
        Self::respond(MockResponse::ok(body.to_string()))
    }

    /// Fail every request with the given error.
    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Requests sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.handler)(&request);
        self.requests.lock().push(request);
        Ok(response?.into_response())
    }
}
