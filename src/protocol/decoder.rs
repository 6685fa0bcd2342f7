//! # Frame Decoder
//!
//! Validates inbound datagrams before they are allowed near the active slot.

use super::crc::crc16;
use super::frame::*;
use crate::error::FrameError;

/// Validate a received frame
///
/// # Arguments
///
/// * `frame` - Exactly the bytes received (header, bundles, CRC)
/// * `expected_version` - Protocol version this controller accepts
///
/// # Returns
///
/// * `Result<FrameHeader, FrameError>` - Decoded header, or why the frame is dropped
///
/// # Errors
///
/// Returns error if:
/// - Frame is shorter than header + CRC or longer than 256 bytes
/// - Version byte differs from `expected_version`
/// - Big-endian trailing CRC differs from the CRC of everything before it
///
/// Bundles are not inspected; the CRC is their only protection.
pub fn decode_frame(frame: &[u8], expected_version: u8) -> Result<FrameHeader, FrameError> {
    let len = frame.len();

    if len < MIN_FRAME_LEN {
        return Err(FrameError::Truncated { len });
    }

    if len > MAX_FRAME_SIZE {
        return Err(FrameError::Oversized { len });
    }

    let version = frame[VERSION_OFFSET];
    if version != expected_version {
        return Err(FrameError::VersionMismatch {
            expected: expected_version,
            actual: version,
        });
    }

    let body_len = len - CRC_LEN;
    let received_crc = u16::from_be_bytes([frame[body_len], frame[body_len + 1]]);
    let calculated_crc = crc16(&frame[..body_len]);

    if calculated_crc != received_crc {
        return Err(FrameError::CrcMismatch {
            expected: calculated_crc,
            actual: received_crc,
        });
    }

    Ok(FrameHeader {
        message_type: MessageType::from(frame[0]),
        protocol_version: version,
        device_id: frame[2],
        len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::encode_control_frame;

    fn sample_frame() -> Vec<u8> {
        encode_control_frame(PROTOCOL_VERSION, device_id::DESKTOP_DS, &[0x03, 0x07, 0x80])
    }

    #[test]
    fn test_decode_valid_control_frame() {
        let frame = sample_frame();
        let header = decode_frame(&frame, PROTOCOL_VERSION).unwrap();

        assert_eq!(header.message_type, MessageType::Control);
        assert_eq!(header.protocol_version, PROTOCOL_VERSION);
        assert_eq!(header.device_id, device_id::DESKTOP_DS);
        assert_eq!(header.len, 8);
    }

    #[test]
    fn test_decode_frame_with_handwritten_crc() {
        let mut frame = vec![0x01, 0x02, 0xFF, 0x03, 0x07, 0x80];
        let crc = crc16(&frame);
        frame.push((crc >> 8) as u8);
        frame.push((crc & 0xFF) as u8);

        assert!(decode_frame(&frame, PROTOCOL_VERSION).is_ok());
    }

    #[test]
    fn test_decode_frame_too_short() {
        assert_eq!(
            decode_frame(&[], PROTOCOL_VERSION),
            Err(FrameError::Truncated { len: 0 })
        );
        assert_eq!(
            decode_frame(&[0x01, 0x02, 0xFF, 0x00], PROTOCOL_VERSION),
            Err(FrameError::Truncated { len: 4 })
        );
    }

    #[test]
    fn test_decode_frame_too_long() {
        let frame = vec![0u8; MAX_FRAME_SIZE + 1];
        assert_eq!(
            decode_frame(&frame, PROTOCOL_VERSION),
            Err(FrameError::Oversized { len: 257 })
        );
    }

    #[test]
    fn test_decode_frame_version_mismatch() {
        let frame = encode_control_frame(0x01, device_id::DESKTOP_DS, &[0x02, 0x07, 0x80]);
        assert_eq!(
            decode_frame(&frame, PROTOCOL_VERSION),
            Err(FrameError::VersionMismatch { expected: 0x02, actual: 0x01 })
        );
    }

    #[test]
    fn test_decode_frame_crc_error() {
        let mut frame = sample_frame();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;

        assert!(matches!(
            decode_frame(&frame, PROTOCOL_VERSION),
            Err(FrameError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_any_single_bit_flip() {
        let frame = encode_control_frame(
            PROTOCOL_VERSION,
            device_id::DESKTOP_DS,
            &[0x08, 0x01, 10, 20, 30, 40, 0, 1, 0x3F],
        );
        let body_len = frame.len() - CRC_LEN;

        for byte in 0..body_len {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    decode_frame(&corrupted, PROTOCOL_VERSION).is_err(),
                    "flip at byte {} bit {} was accepted",
                    byte,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_decode_query_frame() {
        let mut frame = vec![MessageType::QUERY, PROTOCOL_VERSION, device_id::ANDROID_DS];
        let crc = crc16(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());

        let header = decode_frame(&frame, PROTOCOL_VERSION).unwrap();
        assert_eq!(header.message_type, MessageType::Query);
        assert!(!header.is_committable_control());
    }
}
