//! Request bodies and their wire encoding.
//!
//! # Design
//! `Body` is a closed sum of the four supported payload kinds. Encoding
//! dispatches on the variant and never mixes them. Only multipart bodies
//! produce their own content type, because only they carry a boundary the
//! caller cannot know in advance; JSON and form bodies leave the content
//! type to headers or to an adapter such as `JsonContentType`.

use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;
use uuid::Uuid;

use crate::codec::Codec;
use crate::error::ApiError;

/// A value that can be turned into JSON for a request body.
///
/// Implemented for every `Serialize` type, which lets `Body` hold values of
/// different types behind one trait object.
pub trait Encodable: Send + Sync {
    fn to_value(&self) -> Result<Value, serde_json::Error>;
}

impl<T: Serialize + Send + Sync> Encodable for T {
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// One field of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub data: Bytes,
    pub name: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

impl MultipartPart {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            filename: None,
            mime_type: None,
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            filename: Some(filename.into()),
            mime_type: Some(mime_type.into()),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// The payload of a request.
#[derive(Clone)]
pub enum Body {
    /// Bytes sent as-is.
    Raw(Bytes),
    /// A value serialized through the client's codec.
    Json(Arc<dyn Encodable>),
    /// A flat value sent as `key=value&...`.
    Form(Arc<dyn Encodable>),
    /// Ordered `multipart/form-data` parts.
    Multipart(Vec<MultipartPart>),
}

impl Body {
    pub fn raw(data: impl Into<Bytes>) -> Self {
        Body::Raw(data.into())
    }

    pub fn json<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Json(Arc::new(value))
    }

    pub fn form<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Body::Form(Arc::new(value))
    }

    pub fn multipart(parts: Vec<MultipartPart>) -> Self {
        Body::Multipart(parts)
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Body::Multipart(_))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Raw(data) => f.debug_tuple("Raw").field(&data.len()).finish(),
            Body::Json(_) => f.write_str("Json(..)"),
            Body::Form(_) => f.write_str("Form(..)"),
            Body::Multipart(parts) => f.debug_tuple("Multipart").field(parts).finish(),
        }
    }
}

/// Wire form of a `Body`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Encode `body`, generating a fresh boundary for multipart payloads.
pub fn encode(body: &Body, codec: &dyn Codec) -> Result<EncodedBody, ApiError> {
    match body {
        Body::Raw(data) => Ok(EncodedBody {
            bytes: data.clone(),
            content_type: None,
        }),
        Body::Json(value) => {
            let value = value
                .to_value()
                .map_err(|e| ApiError::Encoding(e.to_string()))?;
            Ok(EncodedBody {
                bytes: Bytes::from(codec.encode(&value)?),
                content_type: None,
            })
        }
        Body::Form(value) => {
            let value = value
                .to_value()
                .map_err(|e| ApiError::Encoding(e.to_string()))?;
            Ok(EncodedBody {
                bytes: Bytes::from(encode_form(&value)?),
                content_type: None,
            })
        }
        Body::Multipart(parts) => Ok(encode_multipart(parts, &new_boundary())),
    }
}

/// A unique multipart boundary token.
pub fn new_boundary() -> String {
    format!("Boundary-{}", Uuid::new_v4().simple())
}

/// Flatten a JSON object into `application/x-www-form-urlencoded` pairs.
///
/// Keys come out in the map's order (alphabetical with serde_json's default
/// map). `null` fields are skipped; nested objects and arrays are rejected.
pub fn encode_form(value: &Value) -> Result<String, ApiError> {
    let Value::Object(map) = value else {
        return Err(ApiError::Encoding(
            "form body must serialize to an object".to_string(),
        ));
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, field) in map {
        let rendered = match field {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ApiError::Encoding(format!(
                    "form field `{key}` is not a primitive value"
                )))
            }
        };
        serializer.append_pair(key, &rendered);
    }
    Ok(serializer.finish())
}

/// Frame `parts` as a `multipart/form-data` body delimited by `boundary`.
pub fn encode_multipart(parts: &[MultipartPart], boundary: &str) -> EncodedBody {
    let mut buf = BytesMut::new();

    for part in parts {
        buf.put_slice(b"--");
        buf.put_slice(boundary.as_bytes());
        buf.put_slice(b"\r\n");

        buf.put_slice(b"Content-Disposition: form-data; name=\"");
        buf.put_slice(part.name.as_bytes());
        buf.put_slice(b"\"");
        if let Some(filename) = &part.filename {
            buf.put_slice(b"; filename=\"");
            buf.put_slice(filename.as_bytes());
            buf.put_slice(b"\"");
        }
        buf.put_slice(b"\r\n");

        if let Some(mime_type) = &part.mime_type {
            buf.put_slice(b"Content-Type: ");
            buf.put_slice(mime_type.as_bytes());
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");

        buf.put_slice(&part.data);
        buf.put_slice(b"\r\n");
    }

    buf.put_slice(b"--");
    buf.put_slice(boundary.as_bytes());
    buf.put_slice(b"--\r\n");

    EncodedBody {
        bytes: buf.freeze(),
        content_type: Some(format!("multipart/form-data; boundary={boundary}")),
    }
}
