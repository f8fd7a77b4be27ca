//! Request adapters: transformations applied to every request while it is
//! being built, in registration order.

use crate::error::ApiError;
use crate::http::{HttpRequest, CONTENT_TYPE};

/// Transforms a request before it is finalized.
///
/// Adapters run after the URL, cache policy and timeout are set and before
/// the endpoint's method, headers and body are applied. Headers declared by
/// the endpoint therefore win over headers an adapter set.
pub trait RequestAdapter: Send + Sync {
    fn adapt(&self, request: HttpRequest) -> Result<HttpRequest, ApiError>;
}

impl<F> RequestAdapter for F
where
    F: Fn(HttpRequest) -> Result<HttpRequest, ApiError> + Send + Sync,
{
    fn adapt(&self, request: HttpRequest) -> Result<HttpRequest, ApiError> {
        self(request)
    }
}

/// Run `adapters` left to right, feeding each one's output to the next.
pub fn apply_all(
    adapters: &[std::sync::Arc<dyn RequestAdapter>],
    request: HttpRequest,
) -> Result<HttpRequest, ApiError> {
    adapters
        .iter()
        .try_fold(request, |request, adapter| adapter.adapt(request))
}

/// Sets `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestAdapter for BearerAuth {
    fn adapt(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        if self.token.is_empty() {
            return Err(ApiError::Adapter("bearer token is empty".to_string()));
        }
        request.set_header("Authorization", format!("Bearer {}", self.token));
        Ok(request)
    }
}

/// Sets a fixed list of headers on every request.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: Vec<(String, String)>,
}

impl StaticHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RequestAdapter for StaticHeaders {
    fn adapt(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        for (name, value) in &self.headers {
            request.set_header(name.clone(), value.clone());
        }
        Ok(request)
    }
}

/// Declares `Content-Type: application/json` on requests that do not set a
/// content type of their own.
///
/// Bodiless requests are left alone. Multipart bodies still end up with
/// their own boundary content type, which the builder sets after adapters.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContentType;

impl RequestAdapter for JsonContentType {
    fn adapt(&self, mut request: HttpRequest) -> Result<HttpRequest, ApiError> {
        if request.body.is_some() && request.content_type().is_none() {
            request.set_header(CONTENT_TYPE, "application/json");
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CachePolicy;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    fn request() -> HttpRequest {
        HttpRequest::new(
            Url::parse("https://example.com").unwrap(),
            CachePolicy::default(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn bearer_sets_authorization() {
        let req = BearerAuth::new("1234").adapt(request()).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer 1234"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn empty_bearer_is_rejected() {
        let err = BearerAuth::new("").adapt(request()).unwrap_err();
        assert!(matches!(err, ApiError::Adapter(_)));
    }

    #[test]
    fn static_headers_are_all_applied() {
        let adapter = StaticHeaders::new()
            .header("User-Agent", "endpoint-core")
            .header("Accept", "application/json");
        let req = adapter.adapt(request()).unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn json_content_type_keeps_existing_value() {
        let mut req = request();
        req.body = Some(Bytes::from_static(b"{}"));
        req.set_header("content-type", "text/plain");
        let req = JsonContentType.adapt(req).unwrap();
        assert_eq!(req.content_type(), Some("text/plain"));

        let mut req = request();
        req.body = Some(Bytes::from_static(b"{}"));
        let req = JsonContentType.adapt(req).unwrap();
        assert_eq!(req.content_type(), Some("application/json"));
    }

    #[test]
    fn json_content_type_skips_bodiless_requests() {
        let req = JsonContentType.adapt(request()).unwrap();
        assert!(req.content_type().is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn adapters_run_in_order() {
        let adapters: Vec<Arc<dyn RequestAdapter>> = vec![
            Arc::new(|mut req: HttpRequest| -> Result<HttpRequest, ApiError> {
                req.set_header("X-Order", "first");
                Ok(req)
            }),
            Arc::new(|mut req: HttpRequest| -> Result<HttpRequest, ApiError> {
                let seen = req.header("X-Order").unwrap_or_default().to_string();
                req.set_header("X-Order", format!("{seen},second"));
                Ok(req)
            }),
        ];
        let req = apply_all(&adapters, request()).unwrap();
        assert_eq!(req.header("X-Order"), Some("first,second"));
    }

    #[test]
    fn failing_adapter_stops_the_chain() {
        let adapters: Vec<Arc<dyn RequestAdapter>> = vec![
            Arc::new(|_req: HttpRequest| -> Result<HttpRequest, ApiError> {
                Err(ApiError::Adapter("nope".into()))
            }),
            Arc::new(|_req: HttpRequest| -> Result<HttpRequest, ApiError> {
                panic!("must not run")
            }),
        ];
        let err = apply_all(&adapters, request()).unwrap_err();
        assert!(matches!(err, ApiError::Adapter(msg) if msg == "nope"));
    }
}
