//! # Frame and Record Encoder
//!
//! Stamps CRCs onto outbound feedback frames and builds the fixed-size
//! records forwarded to the actuator co-processor.

use super::crc::crc16;
use super::frame::*;

/// Number of PWM / relay channels driven by the co-processor
pub const ACTUATOR_CHANNELS: usize = 10;

/// Co-processor record: sync(2) + channels(10) + crc(2)
pub const ACTUATOR_RECORD_LEN: usize = 14;

/// Leading bytes of every co-processor record
pub const ACTUATOR_RECORD_SYNC: [u8; 2] = [0xFF, 0x00];

/// Co-processor record bytes
pub type ActuatorRecord = [u8; ACTUATOR_RECORD_LEN];

/// Append a big-endian CRC16 of `buf[..body_len]` at `body_len`
///
/// # Returns
///
/// * `usize` - Total frame length (body + CRC)
///
/// The caller guarantees `body_len + 2 <= buf.len()`.
pub fn seal_frame(buf: &mut [u8], body_len: usize) -> usize {
    let crc = crc16(&buf[..body_len]);
    buf[body_len..body_len + CRC_LEN].copy_from_slice(&crc.to_be_bytes());
    body_len + CRC_LEN
}

/// Build a complete control frame the way a driver station does
///
/// # Arguments
///
/// * `version` - Protocol version byte
/// * `device_id` - Sender device id
/// * `bundles` - Already packed bundle bytes
///
/// # Examples
///
/// ```
/// use robot_link::protocol::encoder::encode_control_frame;
///
/// let frame = encode_control_frame(0x02, 0x01, &[0x03, 0x07, 0x80]);
/// assert_eq!(frame.len(), 8);
/// ```
pub fn encode_control_frame(version: u8, device_id: u8, bundles: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(CONTROL_HEADER_LEN + bundles.len() + CRC_LEN);
    frame.push(MessageType::CONTROL);
    frame.push(version);
    frame.push(device_id);
    frame.extend_from_slice(bundles);

    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Encode the PWM channel record
///
/// `[0xFF, 0x00, ch1..ch10, crc16-hi, crc16-lo]`
pub fn encode_pwm_record(channels: &[u8; ACTUATOR_CHANNELS]) -> ActuatorRecord {
    encode_actuator_record(channels, 0)
}

/// Encode the relay channel record
///
/// Same shape as the PWM record; the CRC is offset by one so the
/// co-processor can tell the two apart.
pub fn encode_relay_record(channels: &[u8; ACTUATOR_CHANNELS]) -> ActuatorRecord {
    encode_actuator_record(channels, 1)
}

fn encode_actuator_record(channels: &[u8; ACTUATOR_CHANNELS], crc_offset: u16) -> ActuatorRecord {
    let mut record = [0u8; ACTUATOR_RECORD_LEN];
    record[..2].copy_from_slice(&ACTUATOR_RECORD_SYNC);
    record[2..2 + ACTUATOR_CHANNELS].copy_from_slice(channels);

    let body_len = ACTUATOR_RECORD_LEN - CRC_LEN;
    let crc = crc16(&record[..body_len]).wrapping_add(crc_offset);
    record[body_len..].copy_from_slice(&crc.to_be_bytes());

    record
}
