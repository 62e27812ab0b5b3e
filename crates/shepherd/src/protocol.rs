//! # Game Protocol
//!
//! Payloads carried inside transport messages. All multi-byte values are
//! big-endian. Readers tolerate trailing bytes.
//!
//! ## Packets
//!
//! ```text
//! Setup (host → guest, once per game, 116 bytes):
//!   i64 start_time_ms
//!   6 × { u8 color, u8 visible, f32 x, f32 y, f32 vx, f32 vy }
//!
//! Play (both ways, first byte is the opcode):
//!   0x0a SELECTION_BEGIN  f32 x, f32 y
//!   0x0b SELECTION_MOVING f32 x, f32 y
//!   0x0c SELECTION_END
//!   0x14 HIDE_SHEEP       i32 count, count × i32 index
//!   0x1e END_GAME         u8 winner color
//!
//! Decision (host → guest, after a game, 1 byte):
//!   0x00 END | 0x01 PLAY_AGAIN
//! ```

use thiserror::Error;

use crate::game::{Sheep, SheepColor, Vec2};
use crate::MAX_SHEEP;

const OP_SELECTION_BEGIN: u8 = 0x0a;
const OP_SELECTION_MOVING: u8 = 0x0b;
const OP_SELECTION_END: u8 = 0x0c;
const OP_HIDE_SHEEP: u8 = 0x14;
const OP_END_GAME: u8 = 0x1e;

/// Errors raised while decoding a peer payload.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload has no bytes.
    #[error("empty payload")]
    Empty,

    /// The first byte is not a known opcode.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// The payload ends before the packet does.
    #[error("truncated packet (expected {expected} bytes, got {actual})")]
    Truncated {
        /// Bytes the packet needs.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },

    /// A color byte is neither white nor dark.
    #[error("invalid sheep color {0}")]
    InvalidColor(u8),

    /// A count or index is negative.
    #[error("negative count or index {0}")]
    Negative(i32),
}

/// Appends big-endian values to a byte buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
}

impl WireWriter {
    /// Creates a writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    /// Writes an i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes an i64.
    #[inline]
    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes an f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Hands the buffer over.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Reads big-endian values from a byte slice.
pub struct WireReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader over `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not yet read.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.position..self.position + N)?;
        self.position += N;
        bytes.try_into().ok()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[byte]| byte)
    }

    /// Reads an i32.
    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_be_bytes)
    }

    /// Reads an i64.
    #[inline]
    pub fn read_i64(&mut self) -> Option<i64> {
        self.take().map(i64::from_be_bytes)
    }

    /// Reads an f32.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        self.take().map(f32::from_be_bytes)
    }
}

/// Messages exchanged while playing.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayPacket {
    /// The peer pressed at `(x, y)`.
    SelectionBegin {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
    /// The peer dragged to `(x, y)`.
    SelectionMoving {
        /// Horizontal position.
        x: f32,
        /// Vertical position.
        y: f32,
    },
    /// The peer released.
    SelectionEnd,
    /// The peer caught these sheep.
    HideSheep {
        /// Flock indices.
        indices: Vec<u32>,
    },
    /// The game is over.
    EndGame {
        /// Color of the winning player.
        winner: SheepColor,
    },
}

impl PlayPacket {
    /// Encodes the packet.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(9);
        match self {
            Self::SelectionBegin { x, y } => {
                writer.write_u8(OP_SELECTION_BEGIN).write_f32(*x).write_f32(*y);
            }
            Self::SelectionMoving { x, y } => {
                writer.write_u8(OP_SELECTION_MOVING).write_f32(*x).write_f32(*y);
            }
            Self::SelectionEnd => {
                writer.write_u8(OP_SELECTION_END);
            }
            Self::HideSheep { indices } => {
                writer
                    .write_u8(OP_HIDE_SHEEP)
                    .write_i32(i32::try_from(indices.len()).unwrap_or(i32::MAX));
                for &index in indices {
                    writer.write_i32(index as i32);
                }
            }
            Self::EndGame { winner } => {
                writer.write_u8(OP_END_GAME).write_u8(winner.to_byte());
            }
        }
        writer.into_bytes()
    }

    /// Decodes a packet.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] for empty, unknown, short or out-of-range
    /// payloads.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut reader = WireReader::new(payload);
        let opcode = reader.read_u8().ok_or(ProtocolError::Empty)?;
        let truncated = |expected| ProtocolError::Truncated {
            expected,
            actual: payload.len(),
        };

        match opcode {
            OP_SELECTION_BEGIN | OP_SELECTION_MOVING => {
                let (x, y) = reader
                    .read_f32()
                    .zip(reader.read_f32())
                    .ok_or_else(|| truncated(9))?;
                Ok(if opcode == OP_SELECTION_BEGIN {
                    Self::SelectionBegin { x, y }
                } else {
                    Self::SelectionMoving { x, y }
                })
            }
            OP_SELECTION_END => Ok(Self::SelectionEnd),
            OP_HIDE_SHEEP => {
                let count = reader.read_i32().ok_or_else(|| truncated(5))?;
                let count = u32::try_from(count).map_err(|_| ProtocolError::Negative(count))?;
                let needed = count as usize * 4;
                if reader.remaining() < needed {
                    return Err(truncated(5 + needed));
                }
                let indices = (0..count)
                    .map(|_| {
                        let index = reader.read_i32().ok_or_else(|| truncated(5 + needed))?;
                        u32::try_from(index).map_err(|_| ProtocolError::Negative(index))
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Self::HideSheep { indices })
            }
            OP_END_GAME => {
                let byte = reader.read_u8().ok_or_else(|| truncated(2))?;
                let winner = SheepColor::from_byte(byte).ok_or(ProtocolError::InvalidColor(byte))?;
                Ok(Self::EndGame { winner })
            }
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// The host's announcement of a new game.
#[derive(Clone, Debug, PartialEq)]
pub struct SetupPacket {
    /// Wall-clock instant both peers start playing at.
    pub start_time_ms: i64,
    /// The flock, with normalized positions.
    pub flock: Vec<Sheep>,
}

impl SetupPacket {
    /// Encoded size of one sheep.
    pub const SHEEP_SIZE: usize = 2 + 4 * 4;

    /// Encoded size of the packet.
    pub const SIZE: usize = 8 + MAX_SHEEP * Self::SHEEP_SIZE;

    /// Encodes the packet. Only the first [`MAX_SHEEP`] sheep are sent.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(Self::SIZE);
        writer.write_i64(self.start_time_ms);
        for sheep in self.flock.iter().take(MAX_SHEEP) {
            writer
                .write_u8(sheep.color.to_byte())
                .write_u8(u8::from(sheep.visible))
                .write_f32(sheep.position.x)
                .write_f32(sheep.position.y)
                .write_f32(sheep.velocity.x)
                .write_f32(sheep.velocity.y);
        }
        writer.into_bytes()
    }

    /// Decodes a packet.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Truncated`] for short payloads and
    /// [`ProtocolError::InvalidColor`] for an unknown color byte.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < Self::SIZE {
            return Err(ProtocolError::Truncated {
                expected: Self::SIZE,
                actual: payload.len(),
            });
        }
        let truncated = ProtocolError::Truncated {
            expected: Self::SIZE,
            actual: payload.len(),
        };
        let mut reader = WireReader::new(payload);
        let start_time_ms = reader.read_i64().ok_or(truncated)?;

        let mut flock = Vec::with_capacity(MAX_SHEEP);
        for _ in 0..MAX_SHEEP {
            let color_byte = reader.read_u8().ok_or(truncated)?;
            let color =
                SheepColor::from_byte(color_byte).ok_or(ProtocolError::InvalidColor(color_byte))?;
            let visible = reader.read_u8().ok_or(truncated)? != 0;
            let position = Vec2::new(
                reader.read_f32().ok_or(truncated)?,
                reader.read_f32().ok_or(truncated)?,
            );
            let velocity = Vec2::new(
                reader.read_f32().ok_or(truncated)?,
                reader.read_f32().ok_or(truncated)?,
            );
            flock.push(Sheep {
                color,
                visible,
                position,
                velocity,
            });
        }

        Ok(Self {
            start_time_ms,
            flock,
        })
    }
}

/// What the host decided once a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HostDecision {
    /// Close the session.
    End = 0x00,
    /// Start a new game on the same connection.
    PlayAgain = 0x01,
}

impl HostDecision {
    /// Encodes the decision byte.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        vec![self as u8]
    }

    /// Decodes a decision payload, accepting up to three bytes of zero
    /// padding. Returns `None` for anything else, such as a late play packet
    /// or a setup packet.
    #[must_use]
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let (&first, padding) = payload.split_first()?;
        if padding.len() > 3 || padding.iter().any(|&byte| byte != 0) {
            return None;
        }
        match first {
            0x00 => Some(Self::End),
            0x01 => Some(Self::PlayAgain),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_begin_bytes() {
        let bytes = PlayPacket::SelectionBegin { x: 1.0, y: -2.0 }.encode();
        assert_eq!(bytes, vec![0x0a, 0x3f, 0x80, 0, 0, 0xc0, 0, 0, 0]);
    }

    #[test]
    fn test_hide_sheep_bytes() {
        let packet = PlayPacket::HideSheep { indices: vec![0, 4] };
        let bytes = packet.encode();
        assert_eq!(bytes, vec![0x14, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 4]);
        assert_eq!(PlayPacket::decode(&bytes), Ok(packet));
    }

    #[test]
    fn test_end_game_and_trailing_padding() {
        let mut bytes = PlayPacket::EndGame {
            winner: SheepColor::Dark,
        }
        .encode();
        assert_eq!(bytes, vec![0x1e, 0x01]);

        bytes.extend_from_slice(&[0, 0, 0]);
        assert_eq!(
            PlayPacket::decode(&bytes),
            Ok(PlayPacket::EndGame {
                winner: SheepColor::Dark
            })
        );
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert_eq!(PlayPacket::decode(&[]), Err(ProtocolError::Empty));
        assert_eq!(PlayPacket::decode(&[0x42]), Err(ProtocolError::UnknownOpcode(0x42)));
        assert!(matches!(
            PlayPacket::decode(&[0x0b, 0, 0]),
            Err(ProtocolError::Truncated { expected: 9, actual: 3 })
        ));
        assert_eq!(PlayPacket::decode(&[0x1e, 7]), Err(ProtocolError::InvalidColor(7)));
        assert_eq!(
            PlayPacket::decode(&[0x14, 0xff, 0xff, 0xff, 0xff]),
            Err(ProtocolError::Negative(-1))
        );
        // A huge count with no indices behind it.
        assert!(matches!(
            PlayPacket::decode(&[0x14, 0x7f, 0xff, 0xff, 0xff]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_setup_layout() {
        let flock: Vec<Sheep> = (0..MAX_SHEEP)
            .map(|i| {
                let color = if i % 2 == 0 { SheepColor::White } else { SheepColor::Dark };
                Sheep::new(color, Vec2::new(0.25, 0.5), Vec2::new(300.0, -310.0))
            })
            .collect();
        let packet = SetupPacket {
            start_time_ms: 0x0102_0304_0506_0708,
            flock,
        };

        let bytes = packet.encode();
        assert_eq!(bytes.len(), SetupPacket::SIZE);
        assert_eq!(SetupPacket::SIZE, 116);
        assert_eq!(&bytes[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&bytes[8..10], &[0, 1]);
        assert_eq!(&bytes[26..28], &[1, 1]);

        assert_eq!(SetupPacket::decode(&bytes), Ok(packet));
        assert!(matches!(
            SetupPacket::decode(&bytes[..100]),
            Err(ProtocolError::Truncated { expected: 116, actual: 100 })
        ));
    }

    #[test]
    fn test_decision_byte() {
        assert_eq!(HostDecision::End.encode(), vec![0x00]);
        assert_eq!(HostDecision::PlayAgain.encode(), vec![0x01]);
        assert_eq!(HostDecision::decode(&[0x01, 0, 0, 0]), Some(HostDecision::PlayAgain));
        assert_eq!(HostDecision::decode(&[0x0c]), None);
        assert_eq!(HostDecision::decode(&[]), None);
        assert_eq!(HostDecision::decode(&[0x00, 0x00, 0x00, 0x00, 0x00]), None);
        assert_eq!(HostDecision::decode(&[0x00, 0x01]), None);

        let setup = SetupPacket {
            start_time_ms: 1_700_000_000_000,
            flock: vec![Sheep::new(SheepColor::White, Vec2::ZERO, Vec2::ZERO); MAX_SHEEP],
        };
        assert_eq!(HostDecision::decode(&setup.encode()), None);
    }
}
