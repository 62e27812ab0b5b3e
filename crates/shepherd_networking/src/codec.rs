//! # Wire Codec
//!
//! Every message travels as a 4-byte big-endian length followed by exactly
//! that many payload bytes:
//!
//! ```text
//! ┌──────────────┬─────────────────────────┐
//! │ u32 BE len   │ payload (len bytes)     │
//! └──────────────┴─────────────────────────┘
//! ```
//!
//! Reads from a stream arrive in arbitrary chunks. [`FrameDecoder`] buffers
//! partial prefixes and partial payloads across reads and only ever yields
//! complete frames.

use thiserror::Error;

/// Size of the length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest accepted payload (16 MiB). A bigger length prefix means the
/// stream is corrupt.
pub const MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

/// Framing failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The payload (or announced payload) exceeds the size limit.
    #[error("message too large: {len} bytes (max {max})")]
    TooLarge {
        /// Offending length.
        len: u64,
        /// Limit in force.
        max: u32,
    },
}

/// Encodes `payload` into a new frame.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] if the payload exceeds [`MAX_MESSAGE_SIZE`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    encode_frame_into(payload, &mut frame)?;
    Ok(frame)
}

/// Appends the frame for `payload` to `out`.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] if the payload exceeds [`MAX_MESSAGE_SIZE`].
pub fn encode_frame_into(payload: &[u8], out: &mut Vec<u8>) -> Result<(), FrameError> {
    let len = payload.len();
    if len > MAX_MESSAGE_SIZE as usize {
        return Err(FrameError::TooLarge {
            len: len as u64,
            max: MAX_MESSAGE_SIZE,
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    let prefix = (len as u32).to_be_bytes();
    out.reserve(LENGTH_PREFIX_SIZE + len);
    out.extend_from_slice(&prefix);
    out.extend_from_slice(payload);
    Ok(())
}

/// Incremental frame decoder.
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes received; everything before `read` was already returned.
    buffer: Vec<u8>,
    /// Start of the first unreturned byte.
    read: usize,
    /// Size limit.
    max: u32,
}

impl FrameDecoder {
    /// Creates a decoder enforcing [`MAX_MESSAGE_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_message_size(MAX_MESSAGE_SIZE)
    }

    /// Creates a decoder enforcing a custom size limit (capped at
    /// [`MAX_MESSAGE_SIZE`]).
    #[must_use]
    pub fn with_max_message_size(max: u32) -> Self {
        Self {
            buffer: Vec::new(),
            read: 0,
            max: max.min(MAX_MESSAGE_SIZE),
        }
    }

    /// Appends freshly read bytes, first dropping the frames already
    /// returned.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.read > 0 {
            self.buffer.drain(..self.read);
            self.read = 0;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Pops the next complete frame's payload.
    ///
    /// Returns `Ok(None)` until enough bytes have arrived.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLarge`] when a length prefix exceeds the limit.
    /// The decoder is unusable afterwards.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let pending = &self.buffer[self.read..];
        let Some(prefix) = pending.get(..LENGTH_PREFIX_SIZE) else {
            return Ok(None);
        };
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        if len > self.max {
            return Err(FrameError::TooLarge {
                len: u64::from(len),
                max: self.max,
            });
        }

        let end = LENGTH_PREFIX_SIZE + len as usize;
        if pending.len() < end {
            return Ok(None);
        }
        let payload = pending[LENGTH_PREFIX_SIZE..end].to_vec();
        self.read += end;
        Ok(Some(payload))
    }

    /// Bytes buffered but not yet returned.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.read
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
