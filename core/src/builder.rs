//! Request construction.
//!
//! # Design
//! `RequestBuilder` accumulates configuration through chained calls and is
//! finalized by `build`, which does not consume or mutate the builder.
//! Building the same builder twice yields equal requests, except that each
//! multipart body gets a fresh boundary.
//!
//! The order inside `build` is fixed:
//! 1. resolve the URL (base + path, then query items);
//! 2. start from a GET with the cache policy and timeout, carrying the
//!    encoded body bytes so adapters can inspect them;
//! 3. run adapters in registration order;
//! 4. apply method and declared headers, overwriting adapter headers;
//! 5. set the body's own content type (multipart only).
//!
//! Paths are appended below the base path. `.` and `..` segments, including
//! their percent-encoded forms, are rejected rather than resolved. Query
//! items use form encoding, so a space becomes `+` rather than `%20`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::adapter::{self, RequestAdapter};
use crate::body::{self, Body};
use crate::codec::{Codec, JsonCodec};
use crate::config::DEFAULT_TIMEOUT;
use crate::endpoint::{Endpoint, HeaderMap, QueryItem};
use crate::error::ApiError;
use crate::http::{CachePolicy, HttpMethod, HttpRequest, CONTENT_TYPE};

/// Chained configuration for one `HttpRequest`.
#[derive(Clone)]
pub struct RequestBuilder {
    base_url: String,
    path: Option<String>,
    method: HttpMethod,
    headers: HeaderMap,
    query_items: Option<Vec<QueryItem>>,
    body: Option<Body>,
    timeout: Duration,
    cache_policy: CachePolicy,
    adapters: Vec<Arc<dyn RequestAdapter>>,
    codec: Arc<dyn Codec>,
}

impl RequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: None,
            method: HttpMethod::Get,
            headers: HeaderMap::new(),
            query_items: None,
            body: None,
            timeout: DEFAULT_TIMEOUT,
            cache_policy: CachePolicy::default(),
            adapters: Vec::new(),
            codec: Arc::new(JsonCodec),
        }
    }

    /// Copy URL parts, method, headers, query and body from `endpoint`.
    /// Timeout and cache policy overrides are applied when present.
    pub fn from_endpoint(endpoint: &dyn Endpoint) -> Self {
        let mut builder = Self::new(endpoint.base_url())
            .path(endpoint.path())
            .method(endpoint.method())
            .headers(endpoint.headers())
            .query_items(endpoint.query_items())
            .body(endpoint.body());
        if let Some(timeout) = endpoint.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(policy) = endpoint.cache_policy() {
            builder = builder.cache_policy(policy);
        }
        builder
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Replace the declared headers.
    pub fn headers(mut self, headers: Option<HeaderMap>) -> Self {
        self.headers = headers.unwrap_or_default();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query_items(mut self, items: Option<Vec<QueryItem>>) -> Self {
        self.query_items = items;
        self
    }

    pub fn body(mut self, body: Option<Body>) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Append adapters; they run after any already registered.
    pub fn adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn RequestAdapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn adapter(mut self, adapter: impl RequestAdapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Base URL with the path appended and query items applied.
    pub fn build_url(&self) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot carry a path",
                self.base_url
            )));
        }

        let path = self
            .path
            .as_deref()
            .ok_or_else(|| ApiError::InvalidUrl("no path set".to_string()))?;
        if let Some(segment) = path.split(['/', '\\']).find(|s| is_dot_segment(s)) {
            return Err(ApiError::InvalidUrl(format!(
                "path segment `{segment}` would leave the base path"
            )));
        }
        let joined = join_path(url.path(), path);
        url.set_path(&joined);

        if let Some(items) = self.query_items.as_deref().filter(|items| !items.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for item in items {
                match &item.value {
                    Some(value) => pairs.append_pair(&item.name, value),
                    None => pairs.append_key_only(&item.name),
                };
            }
        }

        Ok(url)
    }

    pub fn build(&self) -> Result<HttpRequest, ApiError> {
        let url = self.build_url()?;
        let encoded = self
            .body
            .as_ref()
            .map(|body| body::encode(body, self.codec.as_ref()))
            .transpose()?;

        let mut request = HttpRequest::new(url, self.cache_policy, self.timeout);
        request.body = encoded.as_ref().map(|e| e.bytes.clone());
        let mut request = adapter::apply_all(&self.adapters, request)?;

        request.method = self.method;
        for (name, value) in &self.headers {
            let value = header_value(name, value)?;
            validate_header(name, &value)?;
            request.set_header(name.clone(), value);
        }

        if let Some(content_type) = encoded.and_then(|e| e.content_type) {
            request.set_header(CONTENT_TYPE, content_type);
        }

        Ok(request)
    }
}

/// Append `path` to `base`, never replacing what the base already has.
fn join_path(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn header_value(name: &str, value: &Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ApiError::InvalidHeader {
            name: name.to_string(),
            reason: "value is not a string, number or boolean".to_string(),
        }),
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), ApiError> {
    const SEPARATORS: &str = "()<>@,;:\\\"/[]?={} \t";
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_graphic() && !SEPARATORS.contains(c))
    {
        return Err(ApiError::InvalidHeader {
            name: name.to_string(),
            reason: "not a valid header name".to_string(),
        });
    }
    if value.contains(['\r', '\n', '\0']) {
        return Err(ApiError::InvalidHeader {
            name: name.to_string(),
            reason: "value contains control characters".to_string(),
        });
    }
    Ok(())
}
