//! Send orchestration: build, transmit, classify, decode, retry.
//!
//! # Design
//! `ApiClient` holds only shared collaborators (transport, codec, adapters,
//! logger, retry policy) and carries no per-call state, so concurrent sends
//! never interfere. Every public call shape runs the same loop:
//!
//! 1. build a fresh request (adapters re-run on every attempt); build
//!    failures are returned immediately;
//! 2. hand the request to the logger, then to the transport;
//! 3. classify the reply; on success decode and return;
//! 4. on failure log it, return a typed business error if one was requested
//!    and decodes, otherwise ask the retry policy and either loop or return
//!    the original error.
//!
//! The loop has no attempt limit of its own; the retry policy decides when
//! to stop.

use std::convert::Infallible;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::adapter::RequestAdapter;
use crate::builder::RequestBuilder;
use crate::classify::{classify, Outcome};
use crate::codec::{decode_as, Codec, JsonCodec};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, TypedError};
use crate::http::{HttpRequest, HttpResponse};
use crate::logger::Logger;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::Transport;

/// A decoded body together with the reply's status and headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T> {
    pub value: T,
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

/// Asynchronous client for endpoint descriptions.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    adapters: Vec<Arc<dyn RequestAdapter>>,
    logger: Option<Arc<dyn Logger>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    config: ClientConfig,
}

impl ApiClient {
    /// A client with the JSON codec, no adapters, no logger and no retries.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<dyn Transport>) -> ApiClientBuilder {
        ApiClientBuilder {
            transport,
            codec: Arc::new(JsonCodec),
            adapters: Vec::new(),
            logger: None,
            retry_policy: None,
            config: ClientConfig::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the request `endpoint` describes without sending it.
    pub fn build_request(&self, endpoint: &dyn Endpoint) -> Result<HttpRequest, ApiError> {
        RequestBuilder::from_endpoint(endpoint)
            .timeout(endpoint.timeout().unwrap_or(self.config.default_timeout))
            .cache_policy(endpoint.cache_policy().unwrap_or(self.config.cache_policy))
            .adapters(self.adapters.iter().cloned())
            .codec(Arc::clone(&self.codec))
            .build()
    }

    /// Send and decode the success body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, endpoint: &dyn Endpoint) -> Result<T, ApiError> {
        let codec = self.codec.as_ref();
        self.perform(endpoint, |r| decode_as(codec, &r.body), |_| None::<Infallible>)
            .await
            .map_err(untyped)
    }

    /// Like `send`, also returning the status and headers.
    pub async fn send_with_response<T: DeserializeOwned>(
        &self,
        endpoint: &dyn Endpoint,
    ) -> Result<Response<T>, ApiError> {
        let codec = self.codec.as_ref();
        self.perform(
            endpoint,
            |r| {
                Ok(Response {
                    value: decode_as(codec, &r.body)?,
                    status: r.status,
                    headers: r.headers.clone(),
                })
            },
            |_| None::<Infallible>,
        )
        .await
        .map_err(untyped)
    }

    /// Like `send`, but a non-2xx body that decodes as `E` ends the call with
    /// `TypedError::Business` without consulting the retry policy.
    pub async fn send_or_typed<T, E>(&self, endpoint: &dyn Endpoint) -> Result<T, TypedError<E>>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let codec = self.codec.as_ref();
        self.perform(
            endpoint,
            |r| decode_as(codec, &r.body),
            |body| match decode_as::<E>(codec, body) {
                Ok(error) => Some(error),
                Err(e) => {
                    tracing::debug!(error = %e, "error body does not match the typed error");
                    None
                }
            },
        )
        .await
    }

    /// Send and discard the success body.
    pub async fn send_empty(&self, endpoint: &dyn Endpoint) -> Result<(), ApiError> {
        self.perform(endpoint, |_| Ok(()), |_| None::<Infallible>)
            .await
            .map_err(untyped)
    }

    async fn perform<T, B>(
        &self,
        endpoint: &dyn Endpoint,
        decode: impl Fn(&HttpResponse) -> Result<T, ApiError>,
        business: impl Fn(&[u8]) -> Option<B>,
    ) -> Result<T, TypedError<B>> {
        let _finished = CallFinished {
            policy: self.retry_policy.as_deref(),
            endpoint,
        };
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let request = self.build_request(endpoint)?;
            tracing::debug!(method = %request.method, url = %request.url, attempt, "sending request");
            self.log_request(&request);

            let outcome = classify(self.transport.transmit(&request).await);
            let status = outcome.status();
            let error = match outcome {
                Outcome::Success(response) => match decode(&response) {
                    Ok(value) => {
                        tracing::debug!(status = response.status, attempt, "request succeeded");
                        return Ok(value);
                    }
                    Err(e) => e,
                },
                Outcome::Unauthorized(response) => ApiError::Unauthorized {
                    status: response.status,
                    body: response.body,
                },
                Outcome::HttpError(response) => ApiError::Http {
                    status: response.status,
                    body: response.body,
                },
                Outcome::TransportError(e) => ApiError::Transport(e),
            };

            tracing::warn!(method = %request.method, url = %request.url, ?status, error = %error, attempt, "request failed");
            self.log_failure(&request, &error, status);

            if let ApiError::Http { status, body } = &error {
                if let Some(decoded) = business(body) {
                    return Err(TypedError::Business {
                        status: *status,
                        error: decoded,
                    });
                }
            }

            if !self.should_retry(endpoint, &error).await {
                return Err(error.into());
            }
            tracing::info!(url = %request.url, attempt, "retrying request");
        }
    }

    fn log_request(&self, request: &HttpRequest) {
        let Some(logger) = &self.logger else { return };
        if let Some(line) = logger.on_request(request) {
            tracing::info!(target: "endpoint_core::logger", "{line}");
        }
    }

    fn log_failure(&self, request: &HttpRequest, error: &ApiError, status: Option<u16>) {
        let Some(logger) = &self.logger else { return };
        if let Some(line) = logger.on_failure(request, error, status) {
            tracing::info!(target: "endpoint_core::logger", "{line}");
        }
    }

    async fn should_retry(&self, endpoint: &dyn Endpoint, error: &ApiError) -> bool {
        match &self.retry_policy {
            None => false,
            Some(policy) => policy.decide(endpoint, error).await == RetryDecision::Retry,
        }
    }
}

/// Reports the end of a call to the retry policy on every exit path,
/// including a dropped future.
struct CallFinished<'a> {
    policy: Option<&'a dyn RetryPolicy>,
    endpoint: &'a dyn Endpoint,
}

impl Drop for CallFinished<'_> {
    fn drop(&mut self) {
        if let Some(policy) = self.policy {
            policy.call_finished(self.endpoint);
        }
    }
}

fn untyped(err: TypedError<Infallible>) -> ApiError {
    match err {
        TypedError::Api(e) => e,
        TypedError::Business { error, .. } => match error {},
    }
}

/// Collects the collaborators of an `ApiClient`.
pub struct ApiClientBuilder {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    adapters: Vec<Arc<dyn RequestAdapter>>,
    logger: Option<Arc<dyn Logger>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    config: ClientConfig,
}

impl ApiClientBuilder {
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Register an adapter; adapters run in registration order.
    pub fn adapter(mut self, adapter: impl RequestAdapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    pub fn shared_adapter(mut self, adapter: Arc<dyn RequestAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ApiClient {
        ApiClient {
            transport: self.transport,
            codec: self.codec,
            adapters: self.adapters,
            logger: self.logger,
            retry_policy: self.retry_policy,
            config: self.config,
        }
    }
}
