//! # Joystick Bundle Reader
//!
//! Driver stations forward each gamepad as one bundle. Component layout:
//!
//! | Index | Input |
//! |-------|-------|
//! | 0x00 | Left stick X |
//! | 0x01 | Left stick Y |
//! | 0x02 | Right stick X |
//! | 0x03 | Right stick Y |
//! | 0x04 | Left stick click |
//! | 0x05 | Right stick click |
//! | 0x06 | D-pad |
//! | 0x07-0x10 | Buttons 1-10 |
//!
//! Axes are 0-255 with 127 at rest. Buttons are 0 when released.
//!
//! ## Usage
//!
//! ```
//! use robot_link::controller::joystick::{axis, AxisMode, Joystick};
//! use robot_link::protocol::bundle::{encode_bundle, ActiveFrame};
//! use robot_link::protocol::encoder::encode_control_frame;
//!
//! let frame = encode_control_frame(0x02, 0x01, &encode_bundle(0x01, &[0, 255, 127, 127]));
//! let view = ActiveFrame::new(&frame);
//! let pad = Joystick::new(0x01);
//!
//! assert_eq!(pad.make_pwm(&view, axis::LEFT_X, AxisMode::Normal), 0);
//! assert_eq!(pad.make_pwm(&view, axis::LEFT_Y, AxisMode::Inverted), 0);
//! ```

use crate::actuator::PWM_NEUTRAL;
use crate::protocol::bundle::ActiveFrame;

/// Axis component indices.
pub mod axis {
    pub const LEFT_X: usize = 0x00;
    pub const LEFT_Y: usize = 0x01;
    pub const RIGHT_X: usize = 0x02;
    pub const RIGHT_Y: usize = 0x03;
}

/// Button component indices.
pub mod button {
    pub const LEFT_STICK: usize = 0x04;
    pub const RIGHT_STICK: usize = 0x05;
    pub const BTN1: usize = 0x07;
    pub const BTN2: usize = 0x08;
    pub const BTN3: usize = 0x09;
    pub const BTN4: usize = 0x0A;
    pub const BTN5: usize = 0x0B;
    pub const BTN6: usize = 0x0C;
    pub const BTN7: usize = 0x0D;
    pub const BTN8: usize = 0x0E;
    pub const BTN9: usize = 0x0F;
    pub const BTN10: usize = 0x10;
}

/// D-pad component index
pub const DPAD_INDEX: usize = 0x06;

/// D-pad component values.
pub mod dpad {
    pub const UP: u8 = 0x3F;
    pub const UP_LEFT: u8 = 0x1F;
    pub const UP_RIGHT: u8 = 0x5F;
    pub const DOWN: u8 = 0xBF;
    pub const DOWN_LEFT: u8 = 0xDF;
    pub const DOWN_RIGHT: u8 = 0x9F;
    pub const LEFT: u8 = 0xFF;
    pub const RIGHT: u8 = 0x7F;
}

/// Whether a reading is used as-is or flipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    #[default]
    Normal,
    Inverted,
}

/// Reads one gamepad bundle out of the active frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joystick {
    bundle_id: u8,
}

impl Joystick {
    pub fn new(bundle_id: u8) -> Self {
        Self { bundle_id }
    }

    pub fn bundle_id(&self) -> u8 {
        self.bundle_id
    }

    /// Raw component, `None` if the pad is missing from the frame
    pub fn component(&self, frame: &ActiveFrame<'_>, index: usize) -> Option<u8> {
        frame.component_at(self.bundle_id, index)
    }

    /// Component scaled for a PWM output
    ///
    /// A missing reading yields neutral.
    pub fn make_pwm(&self, frame: &ActiveFrame<'_>, index: usize, mode: AxisMode) -> u8 {
        match (self.component(frame, index), mode) {
            (None, _) => PWM_NEUTRAL,
            (Some(value), AxisMode::Normal) => value,
            (Some(value), AxisMode::Inverted) => u8::MAX - value,
        }
    }

    /// Button state; a missing reading counts as released
    pub fn button(&self, frame: &ActiveFrame<'_>, index: usize, mode: AxisMode) -> bool {
        let pressed = self.component(frame, index).unwrap_or(0) != 0;
        match mode {
            AxisMode::Normal => pressed,
            AxisMode::Inverted => !pressed,
        }
    }

    /// True while the D-pad reads `direction`
    pub fn dpad(&self, frame: &ActiveFrame<'_>, direction: u8, mode: AxisMode) -> bool {
        let matches = self.component(frame, DPAD_INDEX) == Some(direction);
        match mode {
            AxisMode::Normal => matches,
            AxisMode::Inverted => !matches,
        }
    }
}
