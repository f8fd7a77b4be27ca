//! Caller-supplied endpoint descriptions.
//!
//! # Design
//! An `Endpoint` is pure data: every method must be cheap and free of I/O.
//! The usual shape is an enum with one variant per API call, matching on
//! `self` in each method.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::body::Body;
use crate::http::{CachePolicy, HttpMethod};

/// One literal query parameter. A `None` value renders as a bare key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Header values as declared by an endpoint. Strings, numbers and booleans
/// are accepted; anything else fails the build with `InvalidHeader`.
pub type HeaderMap = BTreeMap<String, Value>;

/// Static description of one HTTP call.
pub trait Endpoint: Send + Sync {
    /// Absolute base URL, e.g. `https://api.example.com/v1`.
    fn base_url(&self) -> &str;

    /// Path appended to the base URL's own path.
    fn path(&self) -> String;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn body(&self) -> Option<Body> {
        None
    }

    fn query_items(&self) -> Option<Vec<QueryItem>> {
        None
    }

    fn headers(&self) -> Option<HeaderMap> {
        None
    }

    /// Whether failures of this call may be retried at all.
    fn should_retry_on_failure(&self) -> bool {
        false
    }

    /// Overrides the client's default timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Overrides the client's default cache policy.
    fn cache_policy(&self) -> Option<CachePolicy> {
        None
    }
}
