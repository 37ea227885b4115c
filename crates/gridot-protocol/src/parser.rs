//! Newline-delimited JSON framing
//!
//! Each frame is one JSON message terminated by `\n` (a preceding `\r` is
//! tolerated). The parser only buffers; it never touches a socket.

use crate::codec::{self, Format};
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{ClientMessage, ServerMessage};
use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

/// Maximum buffered frame size (1MB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Incremental frame parser
pub struct Parser {
    buffer: BytesMut,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the parser buffer
    pub fn feed(&mut self, data: &[u8]) -> ProtocolResult<()> {
        if self.buffer.len() + data.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: self.buffer.len() + data.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Bytes buffered but not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Split off the next complete frame, skipping blank lines.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            let line_end = self.buffer.iter().position(|&b| b == b'\n')?;

            let mut line = self.buffer.split_to(line_end + 1);
            line.truncate(line_end);
            if line.last() == Some(&b'\r') {
                line.truncate(line_end - 1);
            }

            if !line.iter().all(u8::is_ascii_whitespace) {
                return Some(line.freeze());
            }
        }
    }

    /// Try to parse a complete client message from the buffer
    pub fn next_client_message(&mut self) -> ProtocolResult<Option<ClientMessage>> {
        self.next_frame()
            .map(|frame| ClientMessage::decode(&frame, Format::Json))
            .transpose()
    }

    /// Try to parse a complete server message from the buffer
    pub fn next_server_message(&mut self) -> ProtocolResult<Option<ServerMessage>> {
        self.next_frame()
            .map(|frame| ServerMessage::decode(&frame, Format::Json))
            .transpose()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a message as a single JSON frame
pub fn encode_frame<T: Serialize>(message: &T) -> ProtocolResult<Bytes> {
    let body = codec::encode(message, Format::Json)?;
    if body.len() + 1 > MAX_FRAME_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: body.len() + 1,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut frame = BytesMut::with_capacity(body.len() + 1);
    frame.put_slice(&body);
    frame.put_u8(b'\n');
    Ok(frame.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridot_core::Operation;

    #[test]
    fn test_parse_submit() {
        let msg = ClientMessage::submit("sheet:1", 0, Operation::insert_rows(0, 1));
        let mut parser = Parser::new();
        parser.feed(&encode_frame(&msg).unwrap()).unwrap();

        assert_eq!(parser.next_client_message().unwrap(), Some(msg));
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_incomplete_frame() {
        let mut parser = Parser::new();
        parser.feed(br#"{"kind":"committed","docId":"d","#).unwrap();
        assert!(parser.next_server_message().unwrap().is_none());

        parser.feed(b"\"version\":2}\r\n").unwrap();
        assert_eq!(
            parser.next_server_message().unwrap(),
            Some(ServerMessage::committed("d", 2))
        );
    }

    #[test]
    fn test_multiple_frames_and_blank_lines() {
        let mut parser = Parser::new();
        let mut data = Vec::new();
        data.extend_from_slice(&encode_frame(&ServerMessage::committed("d", 1)).unwrap());
        data.extend_from_slice(b"\r\n\n");
        data.extend_from_slice(&encode_frame(&ServerMessage::committed("d", 2)).unwrap());
        parser.feed(&data).unwrap();

        assert_eq!(parser.next_server_message().unwrap().and_then(|m| m.version()), Some(1));
        assert_eq!(parser.next_server_message().unwrap().and_then(|m| m.version()), Some(2));
        assert!(parser.next_server_message().unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_frame() {
        let mut parser = Parser::new();
        parser.feed(b"not json\n").unwrap();
        assert!(matches!(parser.next_client_message(), Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_oversized_feed_rejected() {
        let mut parser = Parser::new();
        let chunk = vec![b' '; MAX_FRAME_SIZE];
        parser.feed(&chunk).unwrap();
        assert!(matches!(parser.feed(b"x"), Err(ProtocolError::MessageTooLarge { .. })));
    }
}
