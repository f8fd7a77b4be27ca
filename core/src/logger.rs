//! Optional request/failure logging capability.
//!
//! A `Logger` only renders text. `ApiClient` forwards whatever it returns to
//! `tracing` under the `endpoint_core::logger` target; the returned strings
//! never influence the call.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

pub trait Logger: Send + Sync {
    /// Called before each transmission.
    fn on_request(&self, _request: &HttpRequest) -> Option<String> {
        None
    }

    /// Called after a failed transmission or a failed decode.
    fn on_failure(
        &self,
        _request: &HttpRequest,
        _error: &ApiError,
        _status: Option<u16>,
    ) -> Option<String> {
        None
    }
}

/// Renders requests as copy-pasteable cURL commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlLogger;

impl CurlLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn render(request: &HttpRequest) -> String {
        let mut base = format!("curl {}", request.url);
        if request.method == HttpMethod::Head {
            base.push_str(" --head");
        }

        let mut command = vec![base];
        if !matches!(request.method, HttpMethod::Get | HttpMethod::Head) {
            command.push(format!("-X {}", request.method));
        }
        for (name, value) in &request.headers {
            if name.eq_ignore_ascii_case("cookie") {
                continue;
            }
            command.push(format!("-H '{name}: {value}'"));
        }
        if let Some(body) = request.body.as_deref().and_then(|b| std::str::from_utf8(b).ok()) {
            command.push(format!("-d '{body}'"));
        }

        command.join(" \\\n\t")
    }
}

impl Logger for CurlLogger {
    fn on_request(&self, request: &HttpRequest) -> Option<String> {
        Some(Self::render(request))
    }

    fn on_failure(
        &self,
        request: &HttpRequest,
        error: &ApiError,
        status: Option<u16>,
    ) -> Option<String> {
        let status = status.map(|s| format!(" (status {s})")).unwrap_or_default();
        Some(format!(
            "{} {} failed{status}: {error}",
            request.method, request.url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CachePolicy;
    use bytes::Bytes;
    use std::time::Duration;
    use url::Url;

    fn request(method: HttpMethod) -> HttpRequest {
        let mut req = HttpRequest::new(
            Url::parse("https://fakebackend/api/v1/articles").unwrap(),
            CachePolicy::default(),
            Duration::from_secs(1),
        );
        req.method = method;
        req
    }

    #[test]
    fn get_is_a_bare_curl() {
        let line = CurlLogger::render(&request(HttpMethod::Get));
        assert_eq!(line, "curl https://fakebackend/api/v1/articles");
    }

    #[test]
    fn head_uses_head_flag() {
        let line = CurlLogger::render(&request(HttpMethod::Head));
        assert_eq!(line, "curl https://fakebackend/api/v1/articles --head");
    }

    #[test]
    fn post_lists_method_headers_and_body() {
        let mut req = request(HttpMethod::Post);
        req.set_header("Authorization", "Bearer 1234");
        req.set_header("Cookie", "session=secret");
        req.body = Some(Bytes::from_static(b"{\"name\":\"a\"}"));

        let line = CurlLogger::render(&req);
        assert_eq!(
            line,
            "curl https://fakebackend/api/v1/articles \\\n\t-X POST \\\n\t-H 'Authorization: Bearer 1234' \\\n\t-d '{\"name\":\"a\"}'"
        );
        assert!(!line.contains("secret"));
    }

    #[test]
    fn binary_body_is_omitted() {
        let mut req = request(HttpMethod::Put);
        req.body = Some(Bytes::from_static(&[0xff, 0xfe]));
        assert!(!CurlLogger::render(&req).contains("-d"));
    }

    #[test]
    fn failure_line_includes_status() {
        let req = request(HttpMethod::Delete);
        let err = ApiError::Http {
            status: 500,
            body: Bytes::new(),
        };
        let line = CurlLogger.on_failure(&req, &err, Some(500)).unwrap();
        assert_eq!(
            line,
            "DELETE https://fakebackend/api/v1/articles failed (status 500): HTTP 500: "
        );
    }

    #[test]
    fn default_methods_render_nothing() {
        struct Silent;
        impl Logger for Silent {}
        let req = request(HttpMethod::Get);
        assert!(Silent.on_request(&req).is_none());
        assert!(Silent
            .on_failure(&req, &ApiError::Decoding("x".into()), None)
            .is_none());
    }
}
