//! The injected codec used for JSON bodies and response decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Converts between wire bytes and JSON values.
///
/// Mapping values to and from concrete Rust types stays with serde, so a
/// codec only has to decide how values look on the wire.
pub trait Codec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, ApiError>;

    fn decode(&self, bytes: &[u8]) -> Result<Value, ApiError>;
}

/// Compact `serde_json` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(value).map_err(|e| ApiError::Encoding(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, ApiError> {
        serde_json::from_slice(bytes).map_err(|e| ApiError::Decoding(e.to_string()))
    }
}

/// Decode `bytes` through `codec` into `T`.
pub fn decode_as<T: DeserializeOwned>(codec: &dyn Codec, bytes: &[u8]) -> Result<T, ApiError> {
    let value = codec.decode(bytes)?;
    serde_json::from_value(value).map_err(|e| ApiError::Decoding(e.to_string()))
}
