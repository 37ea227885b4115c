//! Message envelopes exchanged with the document authority
//!
//! The authority itself lives outside this workspace. These types pin down
//! the two calls the engine assumes it offers: submitting an operation at a
//! base version, and a stream of committed `(version, operation)` pairs.

use crate::codec::{self, Format};
use crate::error::{ProtocolError, ProtocolResult};
use gridot_core::Operation;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Messages sent by a replica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Submit `op`, generated against `base_version` of the document
    Submit {
        doc_id: String,
        base_version: u64,
        op: Operation,
    },

    /// Receive every operation committed after `from_version`
    Subscribe { doc_id: String, from_version: u64 },
}

/// Messages sent by the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// The submitted operation was committed unchanged
    Committed { doc_id: String, version: u64 },

    /// The submitted operation was committed after rebasing onto operations
    /// the submitter had not seen; `op` is what was actually committed
    Rebase {
        doc_id: String,
        version: u64,
        op: Operation,
    },

    /// An operation committed by another replica
    Update {
        doc_id: String,
        version: u64,
        op: Operation,
    },

    Error { code: String, message: String },
}

impl ClientMessage {
    pub fn submit(doc_id: impl Into<String>, base_version: u64, op: Operation) -> Self {
        ClientMessage::Submit {
            doc_id: doc_id.into(),
            base_version,
            op,
        }
    }

    pub fn subscribe(doc_id: impl Into<String>, from_version: u64) -> Self {
        ClientMessage::Subscribe {
            doc_id: doc_id.into(),
            from_version,
        }
    }

    pub fn doc_id(&self) -> &str {
        match self {
            ClientMessage::Submit { doc_id, .. } | ClientMessage::Subscribe { doc_id, .. } => doc_id,
        }
    }

    pub fn decode(bytes: &[u8], format: Format) -> ProtocolResult<Self> {
        decode_with_op(codec::decode_value(bytes, format)?)
    }
}

impl ServerMessage {
    pub fn committed(doc_id: impl Into<String>, version: u64) -> Self {
        ServerMessage::Committed {
            doc_id: doc_id.into(),
            version,
        }
    }

    pub fn rebase(doc_id: impl Into<String>, version: u64, op: Operation) -> Self {
        ServerMessage::Rebase {
            doc_id: doc_id.into(),
            version,
            op,
        }
    }

    pub fn update(doc_id: impl Into<String>, version: u64, op: Operation) -> Self {
        ServerMessage::Update {
            doc_id: doc_id.into(),
            version,
            op,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Version of the document after this message, if it carries one
    pub fn version(&self) -> Option<u64> {
        match self {
            ServerMessage::Committed { version, .. }
            | ServerMessage::Rebase { version, .. }
            | ServerMessage::Update { version, .. } => Some(*version),
            ServerMessage::Error { .. } => None,
        }
    }

    pub fn decode(bytes: &[u8], format: Format) -> ProtocolResult<Self> {
        decode_with_op(codec::decode_value(bytes, format)?)
    }
}

impl From<&ProtocolError> for ServerMessage {
    fn from(err: &ProtocolError) -> Self {
        ServerMessage::error(err.code(), err.to_string())
    }
}

/// Validate an embedded `op` field before typed decoding so unknown
/// components surface as such.
fn decode_with_op<T: serde::de::DeserializeOwned>(mut value: JsonValue) -> ProtocolResult<T> {
    if let Some(op) = value.get_mut("op") {
        let checked = codec::operation_from_value(op.take())?;
        *op = serde_json::to_value(&checked).map_err(|e| gridot_core::Error::Serialization(e.to_string()))?;
    }
    codec::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridot_core::{CellValue, SetCell};

    #[test]
    fn test_submit_wire_shape() {
        let msg = ClientMessage::submit("sheet:1", 7, Operation::insert_cols(1, 1));
        let json = String::from_utf8(codec::encode(&msg, Format::Json).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"submit","docId":"sheet:1","baseVersion":7,"op":[{"type":"insertCols","index":1,"count":1}]}"#
        );
        assert_eq!(ClientMessage::decode(json.as_bytes(), Format::Json).unwrap(), msg);
    }

    #[test]
    fn test_server_messages_round_trip_msgpack() {
        let op = Operation::set([SetCell::new(0, 0, CellValue::Null, "x")]);
        for msg in [
            ServerMessage::committed("d", 3),
            ServerMessage::rebase("d", 4, op.clone()),
            ServerMessage::update("d", 5, op.clone()),
            ServerMessage::error("UNKNOWN_OP", "nope"),
        ] {
            let bytes = codec::encode(&msg, Format::Msgpack).unwrap();
            assert_eq!(ServerMessage::decode(&bytes, Format::Msgpack).unwrap(), msg);
        }
    }

    #[test]
    fn test_unknown_component_inside_update() {
        let bytes = br#"{"kind":"update","docId":"d","version":2,"op":[{"type":"sortRows"}]}"#;
        let err = ServerMessage::decode(bytes, Format::Json).unwrap_err();
        assert!(matches!(err, ProtocolError::Core(gridot_core::Error::UnknownOperation(_))));

        let reply = ServerMessage::from(&err);
        assert!(matches!(reply, ServerMessage::Error { ref code, .. } if code == "UNKNOWN_OP"));
    }

    #[test]
    fn test_version_accessor() {
        assert_eq!(ServerMessage::committed("d", 9).version(), Some(9));
        assert_eq!(ServerMessage::error("X", "y").version(), None);
        assert_eq!(ClientMessage::subscribe("d", 0).doc_id(), "d");
    }
}
