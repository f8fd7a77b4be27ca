//! Verify request building against JSON test vectors stored in `test-vectors/`.
//!
//! Each case describes an endpoint and either the request it must build or
//! the build error it must fail with. Bodies are compared as text; URLs and
//! header lists are compared exactly, order included.

use endpoint_core::{ApiError, Body, Endpoint, HeaderMap, HttpMethod, QueryItem, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct Vectors {
    cases: Vec<Case>,
}

#[derive(Deserialize)]
struct Case {
    name: String,
    endpoint: VectorEndpoint,
    expected_request: Option<ExpectedRequest>,
    expected_error: Option<String>,
}

#[derive(Deserialize)]
struct VectorEndpoint {
    base_url: String,
    path: String,
    method: String,
    #[serde(default)]
    query: Option<Vec<(String, Option<String>)>>,
    #[serde(default)]
    headers: Option<HeaderMap>,
    #[serde(default)]
    body: Option<VectorBody>,
}

#[derive(Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
enum VectorBody {
    Raw(String),
    Json(Value),
    Form(Value),
}

#[derive(Deserialize)]
struct ExpectedRequest {
    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

impl Endpoint for VectorEndpoint {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn method(&self) -> HttpMethod {
        parse_method(&self.method)
    }

    fn body(&self) -> Option<Body> {
        self.body.as_ref().map(|body| match body {
            VectorBody::Raw(text) => Body::raw(text.clone()),
            VectorBody::Json(value) => Body::json(value.clone()),
            VectorBody::Form(value) => Body::form(value.clone()),
        })
    }

    fn query_items(&self) -> Option<Vec<QueryItem>> {
        self.query.as_ref().map(|items| {
            items
                .iter()
                .map(|(name, value)| match value {
                    Some(value) => QueryItem::new(name.clone(), value.clone()),
                    None => QueryItem::flag(name.clone()),
                })
                .collect()
        })
    }

    fn headers(&self) -> Option<HeaderMap> {
        self.headers.clone()
    }
}

fn error_kind(err: &ApiError) -> &'static str {
    match err {
        ApiError::InvalidUrl(_) => "InvalidUrl",
        ApiError::InvalidHeader { .. } => "InvalidHeader",
        ApiError::Encoding(_) => "Encoding",
        ApiError::Adapter(_) => "Adapter",
        other => panic!("not a build error: {other:?}"),
    }
}

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Vectors = serde_json::from_str(raw).unwrap();
    assert!(!vectors.cases.is_empty());

    for case in &vectors.cases {
        let name = &case.name;
        let result = RequestBuilder::from_endpoint(&case.endpoint).build();

        match (&case.expected_request, &case.expected_error) {
            (Some(expected), None) => {
                let req = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
                assert_eq!(req.method, parse_method(&expected.method), "{name}: method");
                assert_eq!(req.url.as_str(), expected.url, "{name}: url");
                assert_eq!(req.headers, expected.headers, "{name}: headers");

                let body = req
                    .body
                    .as_ref()
                    .map(|b| String::from_utf8(b.to_vec()).unwrap());
                assert_eq!(body, expected.body, "{name}: body");
            }
            (None, Some(expected_error)) => {
                let err = result.err().unwrap_or_else(|| panic!("{name}: expected an error"));
                assert!(err.is_build_error(), "{name}: {err}");
                assert_eq!(error_kind(&err), expected_error.as_str(), "{name}: error kind");
            }
            _ => panic!("{name}: case needs exactly one of expected_request / expected_error"),
        }
    }
}

#[test]
fn built_requests_are_idempotent() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Vectors = serde_json::from_str(raw).unwrap();

    for case in vectors.cases.iter().filter(|c| c.expected_request.is_some()) {
        let builder = RequestBuilder::from_endpoint(&case.endpoint);
        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first.url, second.url, "{}", case.name);
        assert_eq!(first.headers, second.headers, "{}", case.name);
        assert_eq!(first.body, second.body, "{}", case.name);
    }
}
