//! # Frame Constants and Types
//!
//! Wire layout shared by the driver station and the controller.
//!
//! ```text
//! control:  [type:1][version:1][device:1][...bundles...][crc16:2]
//! feedback: [type:1][version:1][device:1][firmware:1][state:1][uptime:1][...bundles...][crc16:2]
//! ```
//!
//! The CRC covers every byte before it and is stored big-endian.

use std::time::Duration;

/// Largest datagram either side will produce or accept
pub const MAX_FRAME_SIZE: usize = 256;

/// Trailing CRC16 length
pub const CRC_LEN: usize = 2;

/// Control frame header: type + version + device id
pub const CONTROL_HEADER_LEN: usize = 3;

/// Feedback frame header: type + version + device id + firmware + state + uptime
pub const FEEDBACK_HEADER_LEN: usize = 6;

/// Smallest frame that carries a header and a CRC
pub const MIN_FRAME_LEN: usize = CONTROL_HEADER_LEN + CRC_LEN;

/// Protocol version spoken by this controller
pub const PROTOCOL_VERSION: u8 = 0x02;

/// Firmware version reported in feedback frames
pub const FIRMWARE_VERSION: u8 = 0x01;

/// Offset of the protocol version byte in every frame
pub const VERSION_OFFSET: usize = 1;

/// Robot state byte reported while enabled
pub const ROBOT_STATE_ENABLED: u8 = 0xFF;

/// Robot state byte reported while disabled
pub const ROBOT_STATE_DISABLED: u8 = 0x00;

/// Device identifiers carried in the third header byte.
pub mod device_id {
    /// Desktop driver station
    pub const DESKTOP_DS: u8 = 0x01;
    /// Android driver station
    pub const ANDROID_DS: u8 = 0x02;
    /// iOS driver station
    pub const IOS_DS: u8 = 0x03;
    /// Robot controller (this side of the link)
    pub const CONTROLLER: u8 = 0xFF;
}

/// Message type carried in the first header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Driver station commands (joystick bundles)
    Control,
    /// Controller telemetry back to the driver station
    Feedback,
    /// Driver station asking for a feedback frame without commanding anything
    Query,
    /// Anything else; still answered with feedback if it validates
    Unknown(u8),
}

impl MessageType {
    pub const CONTROL: u8 = 0x01;
    pub const FEEDBACK: u8 = 0x02;
    pub const QUERY: u8 = 0x03;
}

impl From<u8> for MessageType {
    fn from(value: u8) -> Self {
        match value {
            Self::CONTROL => Self::Control,
            Self::FEEDBACK => Self::Feedback,
            Self::QUERY => Self::Query,
            other => Self::Unknown(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::Control => MessageType::CONTROL,
            MessageType::Feedback => MessageType::FEEDBACK,
            MessageType::Query => MessageType::QUERY,
            MessageType::Unknown(other) => other,
        }
    }
}

/// Header of a validated inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub message_type: MessageType,
    pub protocol_version: u8,
    pub device_id: u8,
    /// Total frame length, CRC included
    pub len: usize,
}

impl FrameHeader {
    /// True for control frames that carry at least one byte past the header
    pub fn is_committable_control(&self) -> bool {
        self.message_type == MessageType::Control && self.len > MIN_FRAME_LEN
    }
}

/// Fixed fields written at the start of every feedback frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackHeader {
    pub protocol_version: u8,
    pub device_id: u8,
    pub firmware_version: u8,
    pub enabled: bool,
    pub uptime_minutes: u8,
}

impl FeedbackHeader {
    /// Whole minutes of uptime, saturating at 255
    pub fn uptime_minutes_from(uptime: Duration) -> u8 {
        (uptime.as_secs() / 60).min(u8::MAX as u64) as u8
    }

    /// Serialize to the six header bytes
    pub fn to_bytes(&self) -> [u8; FEEDBACK_HEADER_LEN] {
        [
            MessageType::FEEDBACK,
            self.protocol_version,
            self.device_id,
            self.firmware_version,
            if self.enabled {
                ROBOT_STATE_ENABLED
            } else {
                ROBOT_STATE_DISABLED
            },
            self.uptime_minutes,
        ]
    }
}
