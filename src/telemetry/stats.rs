//! Link statistics counters.

use serde::Serialize;

use crate::error::FrameError;

/// Running counters for the driver station link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Control frames committed to the active slot
    pub control_frames: u64,
    /// Valid frames of any other type (queries, short control frames)
    pub other_frames: u64,
    /// Datagrams dropped for a bad CRC
    pub crc_errors: u64,
    /// Datagrams dropped for a foreign protocol version
    pub version_errors: u64,
    /// Datagrams too short or too long to be a frame
    pub malformed_frames: u64,
    /// Feedback frames handed to the socket
    pub feedback_sent: u64,
    /// Feedback frames the socket refused
    pub feedback_errors: u64,
    /// Actuator records the serial path refused
    pub actuator_errors: u64,
}

impl LinkStats {
    pub fn record_rejection(&mut self, error: &FrameError) {
        match error {
            FrameError::CrcMismatch { .. } => self.crc_errors += 1,
            FrameError::VersionMismatch { .. } => self.version_errors += 1,
            FrameError::Truncated { .. } | FrameError::Oversized { .. } => {
                self.malformed_frames += 1
            }
        }
    }

    /// Total datagrams dropped by validation
    pub fn rejected(&self) -> u64 {
        self.crc_errors + self.version_errors + self.malformed_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rejection() {
        let mut stats = LinkStats::default();
        stats.record_rejection(&FrameError::CrcMismatch { expected: 1, actual: 2 });
        stats.record_rejection(&FrameError::VersionMismatch { expected: 2, actual: 1 });
        stats.record_rejection(&FrameError::Truncated { len: 1 });
        stats.record_rejection(&FrameError::Oversized { len: 300 });

        assert_eq!(stats.crc_errors, 1);
        assert_eq!(stats.version_errors, 1);
        assert_eq!(stats.malformed_frames, 2);
        assert_eq!(stats.rejected(), 4);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = LinkStats { control_frames: 3, ..Default::default() };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["control_frames"], 3);
        assert_eq!(json["crc_errors"], 0);
    }
}
