//! HTTP request and response types exchanged with the transport.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds an `HttpRequest` once per attempt and hands it to a `Transport`;
//! the transport answers with an `HttpResponse`. Nothing here performs I/O.
//!
//! Headers are kept as an ordered list of `(name, value)` pairs. Names are
//! compared case-insensitively and `set_header` replaces any existing entry,
//! so a request never carries two fields with the same name.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

/// Name of the content type header, as written by the builder.
pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
    Connect,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caching behaviour requested from the transport. The core only carries
/// the flag; interpreting it is up to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Whatever the transport does by default.
    UseProtocolPolicy,
    /// Always go to the origin, ignoring local and intermediate caches.
    #[default]
    ReloadIgnoringCache,
    /// Serve cached data when available, otherwise load.
    ReturnCacheElseLoad,
    /// Serve cached data only; never load.
    ReturnCacheOnly,
}

/// A fully resolved request, ready for transmission.
///
/// Produced by `RequestBuilder::build`. Adapters receive and return it by
/// value while the request is being built; once `build` returns, the core
/// only hands out shared references.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub cache_policy: CachePolicy,
    pub timeout: Duration,
}

impl HttpRequest {
    /// A bodiless GET for `url` with no headers.
    pub fn new(url: Url, cache_policy: CachePolicy, timeout: Duration) -> Self {
        Self {
            url,
            method: HttpMethod::Get,
            headers: Vec::new(),
            body: None,
            cache_policy,
            timeout,
        }
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Set a header, replacing any existing field with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    /// Remove a header by case-insensitive name, returning its value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let idx = self
            .headers
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(idx).1)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }
}

/// A raw HTTP reply described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest::new(
            Url::parse("https://example.com/api").unwrap(),
            CachePolicy::default(),
            Duration::from_secs(100),
        )
    }

    #[test]
    fn new_request_is_bodiless_get() {
        let req = request();
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
        assert_eq!(req.cache_policy, CachePolicy::ReloadIgnoringCache);
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut req = request();
        req.set_header("authorization", "Bearer a");
        req.set_header("Authorization", "Bearer b");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn remove_header_returns_value() {
        let mut req = request();
        req.set_header("X-Trace", "1");
        assert_eq!(req.remove_header("x-trace").as_deref(), Some("1"));
        assert!(req.header("X-Trace").is_none());
        assert!(req.remove_header("X-Trace").is_none());
    }

    #[test]
    fn method_renders_uppercase() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Head.as_str(), "HEAD");
    }

    #[test]
    fn response_header_lookup() {
        let mut resp = HttpResponse::new(200, "ok");
        resp.headers.push(("Content-Type".to_string(), "text/plain".to_string()));
        assert_eq!(resp.header("content-type"), Some("text/plain"));
        assert_eq!(resp.body.len(), 2);
    }
}
