//! # Packet Exchange Buffer
//!
//! Two fixed frame slots. One is always the receive target, the other
//! always holds the last validated control frame. Committing a frame flips
//! the roles; no bytes are copied.

use crate::protocol::bundle::ActiveFrame;
use crate::protocol::frame::MAX_FRAME_SIZE;

/// Storage for one frame
pub type FrameSlot = [u8; MAX_FRAME_SIZE];

/// Double-buffered inbound frame storage
#[derive(Debug, Clone)]
pub struct PacketExchange {
    slots: [FrameSlot; 2],
    /// Index of the slot readers see
    active: usize,
    /// Valid length of the active slot
    active_len: usize,
}

impl Default for PacketExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketExchange {
    /// Creates an exchange with no active frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [[0u8; MAX_FRAME_SIZE]; 2],
            active: 0,
            active_len: 0,
        }
    }

    fn receive_index(&self) -> usize {
        self.active ^ 1
    }

    /// Slot the network path writes the next datagram into
    pub fn receive_buffer(&mut self) -> &mut FrameSlot {
        let index = self.receive_index();
        &mut self.slots[index]
    }

    /// First `len` bytes of the receive slot
    pub fn received(&self, len: usize) -> &[u8] {
        &self.slots[self.receive_index()][..len.min(MAX_FRAME_SIZE)]
    }

    /// Promote the receive slot to active
    ///
    /// Only call after the first `len` bytes of the receive slot validated.
    /// The previously active slot becomes the next receive target.
    pub fn commit(&mut self, len: usize) {
        self.active = self.receive_index();
        self.active_len = len.min(MAX_FRAME_SIZE);
    }

    /// Frame currently in force (empty before the first commit)
    pub fn active(&self) -> ActiveFrame<'_> {
        ActiveFrame::new(&self.slots[self.active][..self.active_len])
    }

    pub fn active_len(&self) -> usize {
        self.active_len
    }
}
