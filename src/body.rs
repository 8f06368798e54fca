//! Event body encoders.
//!
//! The store never interprets a body. It hands the payload to a
//! [`BodyEncoder`] at append time and keeps the resulting bytes together with
//! the [`PayloadEncoding`] that produced them.

use crate::error::Result;
use crate::types::PayloadEncoding;
use serde_json::Value;

/// Encode/decode pair applied around event bodies.
pub trait BodyEncoder: Send + Sync {
    fn encoding(&self) -> PayloadEncoding;

    fn encode(&self, payload: &Value) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}

/// JSON bodies (the default).
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

impl BodyEncoder for JsonEncoder {
    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::Json
    }

    fn encode(&self, payload: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(payload)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(|e| crate::StoreError::Deserialization(e.to_string()))
    }
}

/// MessagePack bodies, for compact logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessagePackEncoder;

impl BodyEncoder for MessagePackEncoder {
    fn encoding(&self) -> PayloadEncoding {
        PayloadEncoding::MessagePack
    }

    fn encode(&self, payload: &Value) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(payload)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// The built-in encoder for an encoding tag.
pub fn encoder_for(encoding: PayloadEncoding) -> &'static dyn BodyEncoder {
    match encoding {
        PayloadEncoding::Json => &JsonEncoder,
        PayloadEncoding::MessagePack => &MessagePackEncoder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use serde_json::json;

    #[test]
    fn test_json_encode_is_plain_json() {
        let bytes = JsonEncoder.encode(&json!({ "qty": 3 })).unwrap();
        assert_eq!(bytes, br#"{"qty":3}"#);
    }

    #[test]
    fn test_messagepack_decodes_what_it_encodes() {
        let payload = json!({ "sku": "A-1", "qty": 3, "tags": ["x", "y"] });
        let bytes = MessagePackEncoder.encode(&payload).unwrap();
        assert_eq!(MessagePackEncoder.decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = JsonEncoder.decode(b"\xff not json");
        assert!(matches!(result, Err(StoreError::Deserialization(_))));
    }

    #[test]
    fn test_encoder_for_matches_tag() {
        assert_eq!(encoder_for(PayloadEncoding::Json).encoding(), PayloadEncoding::Json);
        assert_eq!(
            encoder_for(PayloadEncoding::MessagePack).encoding(),
            PayloadEncoding::MessagePack
        );
    }
}
