//! GridOT wire protocol
//!
//! Serialization contract between replicas and the document authority.
//! Operations are lists of tagged components; component order and every
//! field survive a round trip in either format.
//!
//! ## Frame Format
//! ```text
//! {"kind":"submit","docId":"sheet:1","baseVersion":4,"op":[...]}\n
//! {"kind":"rebase","docId":"sheet:1","version":6,"op":[...]}\n
//! {"kind":"update","docId":"sheet:1","version":7,"op":[...]}\n
//! ```

pub mod codec;
pub mod error;
pub mod message;
pub mod parser;

pub use codec::{decode_operation, decode_snapshot, encode, Format};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{ClientMessage, ServerMessage};
pub use parser::{encode_frame, Parser, MAX_FRAME_SIZE};
