use tokio_util::{
    bytes::{Buf, BufMut, BytesMut},
    codec::{Decoder, Encoder},
};

use tracing::warn;

use crate::error::SessionError;
use crate::frame::{Command, TelnetFrame, TelnetOption, IAC, SB, SE};

/// Largest subnegotiation payload kept for logging; the rest is dropped.
pub const MAX_SUBNEGOTIATION_PAYLOAD: usize = 1024;

/// Splits the client byte stream into one semantic unit per `decode` call:
/// an IAC command pair, a whole subnegotiation block, a line terminator or a
/// single literal byte.
///
/// Nothing here tracks option state; negotiation is fire-and-forget.
#[derive(Debug, Default)]
pub struct DreamerCodec {
    subnegotiation: Option<Capture>,
}

/// An open `IAC SB <option>` block. Bytes are drained from the read buffer
/// as they arrive, so each byte is scanned once.
#[derive(Debug)]
struct Capture {
    option: TelnetOption,
    payload: Vec<u8>,
    consumed: usize,
    discarded: usize,
    last: Option<u8>,
}

impl Capture {
    fn new(option: TelnetOption) -> Self {
        Self {
            option,
            payload: Vec::new(),
            consumed: 3,
            discarded: 0,
            last: None,
        }
    }

    fn append(&mut self, bytes: &[u8]) {
        let room = MAX_SUBNEGOTIATION_PAYLOAD - self.payload.len();
        let kept = bytes.len().min(room);
        self.payload.extend_from_slice(&bytes[..kept]);
        self.discarded += bytes.len() - kept;
        self.consumed += bytes.len();
        if let Some(&byte) = bytes.last() {
            self.last = Some(byte);
        }
    }

    fn finish(mut self) -> TelnetFrame {
        if self.discarded > 0 {
            warn!(
                "subnegotiation {} payload cut to {} bytes, {} dropped",
                self.option, MAX_SUBNEGOTIATION_PAYLOAD, self.discarded
            );
        } else if self.last == Some(IAC) {
            self.payload.pop();
        }

        TelnetFrame::Subnegotiation {
            option: self.option,
            payload: self.payload,
        }
    }
}

impl DreamerCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds buffered bytes into the open block. The block runs up to the
    /// first SE byte, whatever precedes it.
    fn capture(&mut self, src: &mut BytesMut) -> Option<TelnetFrame> {
        let capture = self.subnegotiation.as_mut()?;

        match src.iter().position(|&b| b == SE) {
            Some(end) => {
                capture.append(&src[..end]);
                src.advance(end + 1);
                self.subnegotiation.take().map(Capture::finish)
            }

            None => {
                capture.append(&src[..]);
                src.clear();
                None
            }
        }
    }
}

impl Decoder for DreamerCodec {
    type Item = TelnetFrame;
    type Error = SessionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.subnegotiation.is_some() {
            return Ok(self.capture(src));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let byte = src[0];

        let frame = match byte {
            IAC => {
                // IAC is always followed by exactly a command and an option byte
                if src.len() < 3 {
                    return Ok(None);
                }

                let command = Command::from(src[1]);
                let option = TelnetOption::from(src[2]);
                let begins_block = src[1] == SB;
                src.advance(3);

                if begins_block {
                    self.subnegotiation = Some(Capture::new(option));
                    return Ok(self.capture(src));
                }

                TelnetFrame::Command { command, option }
            }

            b'\r' | b'\n' => {
                src.advance(1);
                TelnetFrame::LineTerminator(byte)
            }

            _ => {
                src.advance(1);
                TelnetFrame::Literal(byte)
            }
        };

        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        match self.subnegotiation.take() {
            Some(capture) => Err(SessionError::ProtocolTruncation {
                pending: capture.consumed + src.len(),
            }),
            None if src.is_empty() => Ok(None),
            None => Err(SessionError::ProtocolTruncation { pending: src.len() }),
        }
    }
}

impl Encoder<TelnetFrame> for DreamerCodec {
    type Error = SessionError;

    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetFrame::Data(data) => dst.extend_from_slice(&data),

            TelnetFrame::Literal(byte) | TelnetFrame::LineTerminator(byte) => dst.put_u8(byte),

            TelnetFrame::Command { command, option } => {
                dst.put_u8(IAC);
                dst.put_u8(command.into());
                dst.put_u8(option.into());
            }

            TelnetFrame::Subnegotiation { option, payload } => {
                dst.put_u8(IAC);
                dst.put_u8(SB);
                dst.put_u8(option.into());
                dst.extend_from_slice(&payload);
                dst.put_u8(IAC);
                dst.put_u8(SE);
            }
        }

        Ok(())
    }
}
