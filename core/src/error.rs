//! Error types for the endpoint client.
//!
//! # Design
//! Construction failures (`InvalidUrl`, `InvalidHeader`, `Encoding`,
//! `Adapter`) are surfaced before anything reaches the network and are never
//! retried. Everything after transmission (`Unauthorized`, `Http`,
//! `Transport`, `Decoding`) goes through the retry policy. 401 and 403 get a
//! dedicated variant because callers usually react to them differently from
//! other non-2xx statuses.
//!
//! Errors are never wrapped or renamed on their way out: whatever the first
//! failing stage produced is what the caller receives.

use bytes::Bytes;

use crate::transport::TransportError;

/// Errors returned by `ApiClient` and the request builder.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Base URL, path or query items do not form a valid absolute URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value cannot be put on the wire.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request body could not be serialized.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// A request adapter rejected the request.
    #[error("adapter failed: {0}")]
    Adapter(String),

    /// The server returned 401 or 403.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16, body: Bytes },

    /// The server returned a non-2xx status other than 401/403.
    #[error("HTTP {status}: {}", String::from_utf8_lossy(body))]
    Http { status: u16, body: Bytes },

    /// The request never produced an HTTP reply.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The success body could not be decoded into the expected type.
    #[error("decoding failed: {0}")]
    Decoding(String),
}

impl ApiError {
    /// Whether the failure happened while building the request.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidUrl(_)
                | ApiError::InvalidHeader { .. }
                | ApiError::Encoding(_)
                | ApiError::Adapter(_)
        )
    }

    /// The HTTP status associated with the failure, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw response body carried by HTTP-level failures.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            ApiError::Unauthorized { body, .. } | ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Failure of a call that asked for typed error bodies.
///
/// `Business` holds the decoded error payload of a non-2xx reply and always
/// terminates the call. Every other failure is reported unchanged in `Api`.
#[derive(Debug, thiserror::Error)]
pub enum TypedError<E> {
    #[error("HTTP {status} business error: {error:?}")]
    Business { status: u16, error: E },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl<E> TypedError<E> {
    pub fn business(&self) -> Option<&E> {
        match self {
            TypedError::Business { error, .. } => Some(error),
            TypedError::Api(_) => None,
        }
    }

    pub fn into_api(self) -> Option<ApiError> {
        match self {
            TypedError::Api(err) => Some(err),
            TypedError::Business { .. } => None,
        }
    }
}
