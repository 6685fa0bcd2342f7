//! # Outbound Telemetry Assembler
//!
//! Collects feedback bundles between sends. Each published value becomes
//!
//! ```text
//! [type tag][bundle id][value, big-endian]
//! ```
//!
//! where the type tag doubles as the bundle length byte (id + value width),
//! so driver stations decode published values with the same scanner they
//! use for control bundles.

use crate::error::AppendError;
use crate::protocol::encoder::seal_frame;
use crate::protocol::frame::{FeedbackHeader, CRC_LEN, FEEDBACK_HEADER_LEN, MAX_FRAME_SIZE};

/// Type tags for published values.
pub mod type_tag {
    /// One-byte value
    pub const BYTE: u8 = 0x02;
    /// Unsigned 16-bit value
    pub const U16: u8 = 0x03;
    /// Signed 32-bit value
    pub const I32: u8 = 0x05;
}

/// Bytes a published value of `width` occupies (tag + id + value)
pub const fn bundle_len(width: usize) -> usize {
    width + 2
}

/// Bounded append-only frame buffer
///
/// Keeps room for the CRC trailer at all times, so sealing never overflows.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    buf: [u8; MAX_FRAME_SIZE],
    len: usize,
    start: usize,
}

impl FrameWriter {
    /// Writer whose cursor starts after a `start`-byte header
    pub fn new(start: usize) -> Self {
        Self {
            buf: [0u8; MAX_FRAME_SIZE],
            len: start,
            start,
        }
    }

    /// Bytes still available before the CRC trailer
    pub fn remaining(&self) -> usize {
        MAX_FRAME_SIZE - CRC_LEN - self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == self.start
    }

    /// Check that `needed` more bytes fit
    pub fn reserve(&self, needed: usize) -> Result<(), AppendError> {
        if needed > self.remaining() {
            return Err(AppendError::FrameFull {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Append all of `bytes` or nothing
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), AppendError> {
        self.reserve(bytes.len())?;
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    /// Bytes written after the header
    pub fn body(&self) -> &[u8] {
        &self.buf[self.start..self.len]
    }

    /// Write `header` into the reserved prefix
    pub fn write_header(&mut self, header: &[u8]) {
        let end = header.len().min(self.start);
        self.buf[..end].copy_from_slice(&header[..end]);
    }

    /// Stamp the CRC and return the complete frame
    pub fn seal(&mut self) -> &[u8] {
        let total = seal_frame(&mut self.buf, self.len);
        &self.buf[..total]
    }

    /// Drop everything after the header
    pub fn clear(&mut self) {
        self.len = self.start;
    }
}

/// Feedback frame under construction
#[derive(Debug, Clone)]
pub struct TelemetryAssembler {
    writer: FrameWriter,
    /// Set by [`request_flush`](Self::request_flush), cleared by [`reset`](Self::reset)
    pending: bool,
}

impl Default for TelemetryAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: FrameWriter::new(FEEDBACK_HEADER_LEN),
            pending: false,
        }
    }

    /// Publish a single byte
    pub fn append_u8(&mut self, bundle_id: u8, value: u8) -> Result<(), AppendError> {
        self.append(type_tag::BYTE, bundle_id, &[value])
    }

    /// Publish an unsigned 16-bit value
    pub fn append_u16(&mut self, bundle_id: u8, value: u16) -> Result<(), AppendError> {
        self.append(type_tag::U16, bundle_id, &value.to_be_bytes())
    }

    /// Publish a signed 32-bit value
    pub fn append_i32(&mut self, bundle_id: u8, value: i32) -> Result<(), AppendError> {
        self.append(type_tag::I32, bundle_id, &value.to_be_bytes())
    }

    /// Check whether a value of `width` bytes would be accepted
    ///
    /// Lets callers skip sampling hardware for a value that would be dropped.
    pub fn check(&self, width: usize) -> Result<(), AppendError> {
        if self.pending {
            return Err(AppendError::FlushPending);
        }
        self.writer.reserve(bundle_len(width))
    }

    fn append(&mut self, tag: u8, bundle_id: u8, value: &[u8]) -> Result<(), AppendError> {
        self.check(value.len())?;

        let mut bundle = [0u8; bundle_len(4)];
        bundle[0] = tag;
        bundle[1] = bundle_id;
        bundle[2..2 + value.len()].copy_from_slice(value);
        self.writer.push(&bundle[..bundle_len(value.len())])
    }

    /// Freeze the frame until the next send
    pub fn request_flush(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Current write offset (starts at the 6-byte header)
    pub fn cursor(&self) -> usize {
        self.writer.len()
    }

    /// Published bundle bytes
    pub fn bundles(&self) -> &[u8] {
        self.writer.body()
    }

    /// Write the header and CRC, returning the frame ready to send
    pub fn finalize(&mut self, header: &FeedbackHeader) -> &[u8] {
        self.writer.write_header(&header.to_bytes());
        self.writer.seal()
    }

    /// Start a fresh frame after a send
    pub fn reset(&mut self) {
        self.writer.clear();
        self.pending = false;
    }
}
