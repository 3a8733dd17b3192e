//! Telnet line codec
//!
//! Turns the raw byte stream of a telnet (or netcat) client into text lines
//! and back.
//!
//! Decoding:
//! - telnet commands are removed: `IAC x`, `IAC WILL|WONT|DO|DONT opt`
//!   and `IAC SB ... IAC SE`
//! - `IAC IAC` is a literal 0xFF byte
//! - CR and NUL are dropped, LF ends a line
//! - text is decoded as UTF-8, invalid sequences replaced
//!
//! Encoding writes every bare LF as CRLF. Outgoing text is UTF-8 and so
//! never contains a raw IAC byte.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

const IAC: u8 = 255;
const SB: u8 = 250;
const SE: u8 = 240;
const WILL: u8 = 251;
const DONT: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    /// Option byte of WILL/WONT/DO/DONT pending
    Negotiate,
    Subnegotiation,
    SubnegotiationIac,
}

#[derive(Debug)]
pub struct TelnetLineCodec {
    max_line_length: usize,
    state: State,
    line: Vec<u8>,
}

impl TelnetLineCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            state: State::Data,
            line: Vec::new(),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        line
    }

    fn push(&mut self, byte: u8) -> Result<(), CodecError> {
        if self.line.len() >= self.max_line_length {
            return Err(CodecError::LineTooLong {
                max: self.max_line_length,
            });
        }
        self.line.push(byte);
        Ok(())
    }
}

impl Decoder for TelnetLineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        let mut consumed = 0;
        let mut complete = false;

        for &byte in src.iter() {
            consumed += 1;
            let next = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, b'\n') => {
                    complete = true;
                    State::Data
                }
                (State::Data, b'\r' | 0) => State::Data,
                (State::Data, _) => {
                    self.push(byte)?;
                    State::Data
                }
                (State::Iac, IAC) => {
                    self.push(IAC)?;
                    State::Data
                }
                (State::Iac, WILL..=DONT) => State::Negotiate,
                (State::Iac, SB) => State::Subnegotiation,
                (State::Iac, _) | (State::Negotiate, _) => State::Data,
                (State::Subnegotiation, IAC) => State::SubnegotiationIac,
                (State::Subnegotiation, _) => State::Subnegotiation,
                (State::SubnegotiationIac, SE) => State::Data,
                (State::SubnegotiationIac, _) => State::Subnegotiation,
            };
            self.state = next;
            if complete {
                break;
            }
        }

        src.advance(consumed);

        if complete {
            Ok(Some(self.take_line()))
        } else {
            Ok(None)
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if self.line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.take_line()))
        }
    }
}

impl Encoder<String> for TelnetLineCodec {
    type Error = CodecError;

    fn encode(&mut self, text: String, dst: &mut BytesMut) -> Result<(), CodecError> {
        dst.reserve(text.len() + 2);
        let mut previous = 0u8;
        for &byte in text.as_bytes() {
            if byte == b'\n' && previous != b'\r' {
                dst.put_slice(b"\r\n");
            } else {
                dst.put_u8(byte);
            }
            previous = byte;
        }
        Ok(())
    }
}
