//! # Error Types
//!
//! Custom error types for Robot Link using `thiserror`.

use thiserror::Error;

/// Reasons an inbound datagram is dropped by the frame codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Too short to hold a header and a CRC
    #[error("frame too short: {len} bytes")]
    Truncated { len: usize },

    /// Larger than the 256-byte frame budget
    #[error("frame too long: {len} bytes")]
    Oversized { len: usize },

    /// Peer speaks a different protocol version
    #[error("protocol version mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// Trailing CRC does not match the frame contents
    #[error("CRC mismatch: computed 0x{expected:04X}, received 0x{actual:04X}")]
    CrcMismatch { expected: u16, actual: u16 },
}

/// Why a telemetry append was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppendError {
    /// Bundle would push the frame past its budget
    #[error("feedback frame full: {needed} bytes needed, {remaining} remaining")]
    FrameFull { needed: usize, remaining: usize },

    /// A flush was requested and has not completed
    #[error("feedback frame is waiting to be sent")]
    FlushPending,
}

/// Main error type for Robot Link
#[derive(Debug, Error)]
pub enum RobotLinkError {
    /// Frame codec errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] FrameError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry record encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Robot Link
pub type Result<T> = std::result::Result<T, RobotLinkError>;
