//! Lossless encoding of operations and snapshots
//!
//! Operations travel as a list of tagged components. Decoding goes through
//! an untyped value first so that a component with an unrecognised `type`
//! is reported as [`gridot_core::Error::UnknownOperation`] rather than as a
//! generic parse failure: it usually means the peers disagree on protocol
//! version.

use crate::error::{ProtocolError, ProtocolResult};
use gridot_core::{Operation, Snapshot, COMPONENT_TYPES};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Encoding used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Msgpack,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Msgpack => write!(f, "msgpack"),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "messagepack" | "mp" => Ok(Format::Msgpack),
            _ => Err(ProtocolError::UnknownFormat(s.to_string())),
        }
    }
}

/// Serialize any protocol value in the given format
pub fn encode<T: Serialize>(value: &T, format: Format) -> ProtocolResult<Vec<u8>> {
    match format {
        Format::Json => serde_json::to_vec(value).map_err(|e| ProtocolError::InvalidJson(e.to_string())),
        // named fields keep the component tag and field names in the payload
        Format::Msgpack => {
            rmp_serde::to_vec_named(value).map_err(|e| ProtocolError::InvalidMsgpack(e.to_string()))
        }
    }
}

/// Decode raw bytes into an untyped value
pub fn decode_value(bytes: &[u8], format: Format) -> ProtocolResult<JsonValue> {
    match format {
        Format::Json => serde_json::from_slice(bytes).map_err(|e| ProtocolError::InvalidJson(e.to_string())),
        Format::Msgpack => {
            rmp_serde::from_slice(bytes).map_err(|e| ProtocolError::InvalidMsgpack(e.to_string()))
        }
    }
}

pub fn decode_operation(bytes: &[u8], format: Format) -> ProtocolResult<Operation> {
    operation_from_value(decode_value(bytes, format)?)
}

pub fn decode_snapshot(bytes: &[u8], format: Format) -> ProtocolResult<Snapshot> {
    from_value(decode_value(bytes, format)?)
}

/// Check every component's `type` tag, then deserialize the operation.
pub fn operation_from_value(value: JsonValue) -> ProtocolResult<Operation> {
    let components = value
        .as_array()
        .ok_or_else(|| ProtocolError::InvalidMessage("operation must be a list of components".into()))?;

    for component in components {
        match component.get("type").and_then(JsonValue::as_str) {
            Some(kind) if COMPONENT_TYPES.contains(&kind) => {}
            Some(kind) => {
                tracing::debug!(kind, "Rejecting unknown component type");
                return Err(gridot_core::Error::UnknownOperation(kind.to_string()).into());
            }
            None => {
                return Err(gridot_core::Error::UnknownOperation(component.to_string()).into());
            }
        }
    }

    from_value(value)
}

pub(crate) fn from_value<T: DeserializeOwned>(value: JsonValue) -> ProtocolResult<T> {
    serde_json::from_value(value).map_err(|e| gridot_core::Error::Serialization(e.to_string()).into())
}
