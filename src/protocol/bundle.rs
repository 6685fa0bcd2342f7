//! # Bundle Index
//!
//! Bundles are the sub-records packed between a frame's header and its CRC:
//!
//! ```text
//! [length:1][bundle id:1][payload: length - 1 bytes]
//! ```
//!
//! `length` counts the id byte plus the payload, so the next bundle starts
//! `length + 1` bytes further on. There is no bundle count; scanning stops at
//! the CRC trailer. Ids need not be unique, the first match wins.

use super::frame::{CONTROL_HEADER_LEN, CRC_LEN};

/// Where a bundle's payload sits inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleInfo {
    /// Absolute offset of the first payload byte
    pub offset: usize,
    /// Payload length as advertised by the length byte (id excluded)
    pub len: usize,
}

/// Pack one bundle in wire form
///
/// # Examples
///
/// ```
/// use robot_link::protocol::bundle::encode_bundle;
///
/// assert_eq!(encode_bundle(0x05, &[0x01, 0x2C]), vec![0x03, 0x05, 0x01, 0x2C]);
/// ```
pub fn encode_bundle(bundle_id: u8, payload: &[u8]) -> Vec<u8> {
    let mut bundle = Vec::with_capacity(payload.len() + 2);
    bundle.push((payload.len() + 1) as u8);
    bundle.push(bundle_id);
    bundle.extend_from_slice(payload);
    bundle
}

/// Find the first bundle with `bundle_id` in a validated frame
///
/// Scanning starts right after the 3-byte control header and stops once the
/// cursor reaches the CRC trailer. A zero length byte cannot come from a
/// well-formed producer and ends the scan.
pub fn locate(frame: &[u8], bundle_id: u8) -> Option<BundleInfo> {
    let end = frame.len().checked_sub(CRC_LEN)?;
    let mut cursor = CONTROL_HEADER_LEN;

    while cursor < end {
        let length = frame[cursor] as usize;
        if length == 0 {
            return None;
        }

        if frame.get(cursor + 1) == Some(&bundle_id) {
            return Some(BundleInfo {
                offset: cursor + 2,
                len: length - 1,
            });
        }

        cursor += length + 1;
    }

    None
}

/// Read-only view of the frame currently in force
///
/// Borrowed from the packet exchange, so it cannot outlive the next commit.
#[derive(Debug, Clone, Copy)]
pub struct ActiveFrame<'a> {
    bytes: &'a [u8],
}

impl<'a> ActiveFrame<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Raw frame bytes, CRC included
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// True until the first control frame has been committed
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn locate(&self, bundle_id: u8) -> Option<BundleInfo> {
        locate(self.bytes, bundle_id)
    }

    /// One payload byte of a bundle
    ///
    /// `None` when the bundle is absent or `index` is past its advertised length.
    pub fn component_at(&self, bundle_id: u8, index: usize) -> Option<u8> {
        let info = self.locate(bundle_id)?;
        if index >= info.len {
            return None;
        }
        self.bytes.get(info.offset + index).copied()
    }

    /// Number of components in a bundle
    ///
    /// One less than the payload length: driver stations count the id byte
    /// twice, and the reported size follows suit.
    pub fn bundle_size(&self, bundle_id: u8) -> Option<usize> {
        self.locate(bundle_id)?.len.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::encode_control_frame;
    use crate::protocol::frame::{device_id, PROTOCOL_VERSION};

    fn frame_with(bundles: &[Vec<u8>]) -> Vec<u8> {
        let packed: Vec<u8> = bundles.iter().flatten().copied().collect();
        encode_control_frame(PROTOCOL_VERSION, device_id::DESKTOP_DS, &packed)
    }

    #[test]
    fn test_locate_single_bundle() {
        let frame = frame_with(&[encode_bundle(0x07, &[0x80, 0x81])]);
        assert_eq!(locate(&frame, 0x07), Some(BundleInfo { offset: 5, len: 2 }));
    }

    #[test]
    fn test_locate_every_position() {
        for count in 0..=20u8 {
            let bundles: Vec<Vec<u8>> = (0..count)
                .map(|id| encode_bundle(id, &vec![id; (id % 4) as usize + 1]))
                .collect();
            let frame = frame_with(&bundles);
            let view = ActiveFrame::new(&frame);

            for id in 0..count {
                let info = view.locate(id).unwrap_or_else(|| panic!("bundle {} of {} missing", id, count));
                assert_eq!(info.len, (id % 4) as usize + 1);
                assert_eq!(view.component_at(id, 0), Some(id));
            }

            assert_eq!(view.locate(0xEE), None);
        }
    }

    #[test]
    fn test_locate_first_match_wins() {
        let frame = frame_with(&[
            encode_bundle(0x01, &[0x10]),
            encode_bundle(0x02, &[0x20]),
            encode_bundle(0x01, &[0x30]),
        ]);
        assert_eq!(ActiveFrame::new(&frame).component_at(0x01, 0), Some(0x10));
    }

    #[test]
    fn test_handwritten_frame_lookup() {
        // [type, version, device, len=3, id=7, 0x80, crc, crc]
        let frame = encode_control_frame(PROTOCOL_VERSION, 0xFF, &[0x03, 0x07, 0x80]);
        let view = ActiveFrame::new(&frame);

        assert_eq!(view.component_at(0x07, 0), Some(0x80));
        assert_eq!(view.bundle_size(0x07), Some(1));
    }

    #[test]
    fn test_component_index_out_of_range() {
        let frame = frame_with(&[encode_bundle(0x01, &[1, 2, 3])]);
        let view = ActiveFrame::new(&frame);

        assert_eq!(view.component_at(0x01, 2), Some(3));
        assert_eq!(view.component_at(0x01, 3), None);
        assert_eq!(view.component_at(0x02, 0), None);
    }

    #[test]
    fn test_zero_value_is_not_absence() {
        let frame = frame_with(&[encode_bundle(0x01, &[0x00, 0xFF])]);
        let view = ActiveFrame::new(&frame);

        assert_eq!(view.component_at(0x01, 0), Some(0x00));
        assert_eq!(view.component_at(0x01, 1), Some(0xFF));
    }

    #[test]
    fn test_bundle_size_counts_id_twice() {
        let frame = frame_with(&[
            encode_bundle(0x01, &[1, 2, 3, 4]),
            encode_bundle(0x02, &[9]),
            encode_bundle(0x03, &[]),
        ]);
        let view = ActiveFrame::new(&frame);

        assert_eq!(view.bundle_size(0x01), Some(3));
        assert_eq!(view.bundle_size(0x02), Some(0));
        assert_eq!(view.bundle_size(0x03), None);
        assert_eq!(view.bundle_size(0x04), None);
    }

    #[test]
    fn test_empty_frame() {
        let view = ActiveFrame::new(&[]);
        assert!(view.is_empty());
        assert_eq!(view.locate(0x00), None);
        assert_eq!(view.component_at(0x00, 0), None);
    }

    #[test]
    fn test_zero_length_stops_scan() {
        let frame = encode_control_frame(PROTOCOL_VERSION, 0x01, &[0x00, 0x05, 0x02, 0x05, 0x11]);
        assert_eq!(locate(&frame, 0x05), None);
    }

    #[test]
    fn test_corrupted_length_does_not_panic() {
        // Length byte points far beyond the frame end
        let frame = encode_control_frame(PROTOCOL_VERSION, 0x01, &[0xF0, 0x01, 0x02]);
        let view = ActiveFrame::new(&frame);

        assert_eq!(view.component_at(0x01, 0), Some(0x02));
        assert_eq!(view.component_at(0x01, 200), None);
        assert_eq!(view.locate(0x02), None);
    }
}
