//! Transport boundary: the single point where the client touches the network.
//!
//! `Transport` is deliberately narrow: send one `HttpRequest`, get back the
//! status, headers and body bytes, or a `TransportError`. Non-2xx statuses
//! are data, not errors; classifying them is the core's job.

use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::http::{CachePolicy, HttpRequest, HttpResponse};

/// Executes requests against the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn transmit(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Coarse category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Cancelled,
    Io,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportErrorKind::Timeout => "timed out",
            TransportErrorKind::Connect => "connection failed",
            TransportErrorKind::Cancelled => "cancelled",
            TransportErrorKind::Io => "I/O error",
            TransportErrorKind::Other => "transport error",
        };
        f.write_str(label)
    }
}

/// A request that never produced an HTTP reply.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else if e.is_body() || e.is_decode() {
            TransportErrorKind::Io
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, e.to_string()).with_source(e)
    }
}

/// `Transport` backed by a `reqwest::Client`.
///
/// The per-request timeout comes from `HttpRequest::timeout`. A
/// `ReloadIgnoringCache` policy adds `Cache-Control: no-cache` unless the
/// request already sets its own cache directive.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn prepare(&self, request: &HttpRequest) -> Result<reqwest::Request, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?;

        let mut builder = self
            .client
            .request(method, request.url.clone())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.cache_policy == CachePolicy::ReloadIgnoringCache
            && request.header("Cache-Control").is_none()
        {
            builder = builder.header("Cache-Control", "no-cache");
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder.build().map_err(TransportError::from)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn transmit(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let prepared = self.prepare(request)?;
        let response = self.client.execute(prepared).await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body: Bytes = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
