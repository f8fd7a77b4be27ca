//! Maps a transport result onto the outcomes the client reacts to.

use crate::http::HttpResponse;
use crate::transport::TransportError;

/// Classified result of one transmission.
#[derive(Debug)]
pub enum Outcome {
    /// 200..=299.
    Success(HttpResponse),
    /// 401 or 403.
    Unauthorized(HttpResponse),
    /// Any other status; the body is kept for typed decoding.
    HttpError(HttpResponse),
    /// No HTTP reply was received.
    TransportError(TransportError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Success(r) | Outcome::Unauthorized(r) | Outcome::HttpError(r) => Some(r.status),
            Outcome::TransportError(_) => None,
        }
    }
}

/// Classify a transport result by status code. Pure; performs no I/O.
pub fn classify(result: Result<HttpResponse, TransportError>) -> Outcome {
    match result {
        Err(e) => Outcome::TransportError(e),
        Ok(response) => match response.status {
            200..=299 => Outcome::Success(response),
            401 | 403 => Outcome::Unauthorized(response),
            _ => Outcome::HttpError(response),
        },
    }
}
