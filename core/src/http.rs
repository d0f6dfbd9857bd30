//! HTTP transport types and the blocking transport used by the client.
//!
//! # Design
//! Requests and responses are plain data. The client builds `HttpRequest`
//! values and normalizes `HttpResponse` values; a `Transport` performs the
//! round-trip in between. Swapping the transport (an in-memory script in
//! tests, `UreqTransport` in production) never changes request building or
//! normalization.
//!
//! Every HTTP status comes back as data, and bodies are raw bytes in any
//! encoding. Only failures to obtain a response at all (DNS, connect,
//! timeout, a body cut off mid-read or past the size cap) are `Err`.

use std::fmt;
use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` never carries a query string; `query` pairs are encoded by the
/// transport, in order, with repeated keys allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// `body` holds the bytes exactly as received; file downloads are not UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Executes one `HttpRequest`.
///
/// Implementations must return 4xx/5xx responses as `Ok`; `Err` is reserved
/// for the case where no response was obtained.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Largest response body `UreqTransport` reads by default, 1 GiB.
///
/// Export file downloads and long historical ranges run well past ureq's own
/// 10 MiB default.
pub const DEFAULT_BODY_LIMIT: u64 = 1024 * 1024 * 1024;

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    /// `timeout` bounds the whole call, connect through body read. `None`
    /// waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Cap on response body size in bytes. A longer body fails the call
    /// with `ApiError::Transport`.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(crate::client::DEFAULT_TIMEOUT_SECS)))
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    for (key, value) in &request.headers {
        builder = builder.header(key, value);
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (HttpMethod::Get, None) => decorate(self.agent.get(url), request).call(),
            // The service reads some GET filters from a JSON body.
            (HttpMethod::Get, Some(body)) => {
                decorate(self.agent.get(url), request).force_send_body().send(body)
            }
            (HttpMethod::Delete, None) => decorate(self.agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(body)) => {
                decorate(self.agent.delete(url), request).force_send_body().send(body)
            }
            (HttpMethod::Options, _) => decorate(self.agent.options(url), request).call(),
            (HttpMethod::Post, Some(body)) => decorate(self.agent.post(url), request).send(body),
            (HttpMethod::Post, None) => decorate(self.agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => decorate(self.agent.put(url), request).send(body),
            (HttpMethod::Put, None) => decorate(self.agent.put(url), request).send_empty(),
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, headers, body })
    }
}
