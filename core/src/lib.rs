//! Asynchronous HTTP client core driven by endpoint descriptions.
//!
//! # Overview
//! An `Endpoint` describes one API call: base URL, path, method, headers,
//! query items and an optional body. `RequestBuilder` turns it into a plain
//! `HttpRequest`, `ApiClient` sends it through a pluggable `Transport`,
//! classifies the reply and decodes it with a `Codec`.
//!
//! # Design
//! - `HttpRequest` / `HttpResponse` are plain data; only `Transport`
//!   implementations touch the network, so everything else is deterministic
//!   and testable with `MockTransport`.
//! - Cross-cutting behaviour plugs in through small traits: `RequestAdapter`
//!   (rewrite outgoing requests), `Logger` (render request and failure lines),
//!   `RetryPolicy` (decide whether a failed call runs again).
//! - Build failures never reach the transport and are never retried.
//! - Logging goes through `tracing`; install a subscriber to see it.

pub mod adapter;
pub mod body;
pub mod builder;
pub mod classify;
pub mod client;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logger;
pub mod mock;
pub mod retry;
pub mod transport;

pub use adapter::{BearerAuth, JsonContentType, RequestAdapter, StaticHeaders};
pub use body::{Body, MultipartPart};
pub use builder::RequestBuilder;
pub use classify::{classify, Outcome};
pub use client::{ApiClient, ApiClientBuilder, Response};
pub use codec::{Codec, JsonCodec};
pub use config::ClientConfig;
pub use endpoint::{Endpoint, HeaderMap, QueryItem};
pub use error::{ApiError, TypedError};
pub use http::{CachePolicy, HttpMethod, HttpRequest, HttpResponse};
pub use logger::{CurlLogger, Logger};
pub use mock::{MockReply, MockTransport};
pub use retry::{BoundedRetry, RetryDecision, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
