//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError, TransportErrorKind};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    Failure(TransportErrorKind, String),
}

impl MockReply {
    pub fn status(status: u16, body: &str) -> Self {
        MockReply::Response(HttpResponse::new(status, body.to_string()))
    }

    pub fn failure(kind: TransportErrorKind, message: &str) -> Self {
        MockReply::Failure(kind, message.to_string())
    }

    fn produce(&self) -> Result<HttpResponse, TransportError> {
        match self {
            MockReply::Response(response) => Ok(response.clone()),
            MockReply::Failure(kind, message) => Err(TransportError::new(*kind, message.clone())),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    last: Option<MockReply>,
    requests: Vec<HttpRequest>,
}

/// Answers with scripted replies in order, repeating the last one once the
/// script runs out. Every request it receives is recorded.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new(script: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            state: Mutex::new(MockState {
                script: script.into_iter().collect(),
                last: None,
                requests: Vec::new(),
            }),
        }
    }

    /// Always answer `status` with `body`.
    pub fn always(status: u16, body: &str) -> Self {
        Self::new([MockReply::status(status, body)])
    }

    pub fn push(&self, reply: MockReply) {
        self.lock().script.push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded state.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn transmit(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let reply = match state.script.pop_front() {
            Some(reply) => {
                state.last = Some(reply.clone());
                reply
            }
            None => state.last.clone().ok_or_else(|| {
                TransportError::new(TransportErrorKind::Other, "mock transport has no replies")
            })?,
        };
        reply.produce()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CachePolicy;
    use std::time::Duration;
    use url::Url;

    fn request() -> HttpRequest {
        HttpRequest::new(
            Url::parse("http://mock/articles").unwrap(),
            CachePolicy::default(),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let mock = MockTransport::new([
            MockReply::failure(TransportErrorKind::Timeout, "slow"),
            MockReply::status(200, "ok"),
        ]);

        let first = mock.transmit(&request()).await.unwrap_err();
        assert_eq!(first.kind(), TransportErrorKind::Timeout);
        assert_eq!(mock.transmit(&request()).await.unwrap().status, 200);
        assert_eq!(mock.transmit(&request()).await.unwrap().status, 200);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn empty_script_is_a_transport_error() {
        let mock = MockTransport::default();
        let err = mock.transmit(&request()).await.unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Other);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn pushed_replies_are_appended() {
        let mock = MockTransport::always(500, "");
        mock.push(MockReply::status(201, "created"));
        assert_eq!(mock.transmit(&request()).await.unwrap().status, 500);
        assert_eq!(mock.transmit(&request()).await.unwrap().status, 201);
    }
}
