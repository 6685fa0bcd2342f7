//! # Actuator Outputs
//!
//! PWM and relay values mirrored to the co-processor after every accepted
//! control frame. Channels are numbered 1 to 10 as printed on the board.

use crate::protocol::encoder::{
    encode_pwm_record, encode_relay_record, ActuatorRecord, ACTUATOR_CHANNELS,
};

/// PWM value for a stopped motor / centered servo
pub const PWM_NEUTRAL: u8 = 127;

/// Relay byte for an energized output
pub const RELAY_ON: u8 = 0xFF;

/// Relay byte for a released output
pub const RELAY_OFF: u8 = 0x00;

/// Latest requested actuator outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorOutputs {
    pwm: [u8; ACTUATOR_CHANNELS],
    relays: [u8; ACTUATOR_CHANNELS],
}

impl Default for ActuatorOutputs {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorOutputs {
    /// All PWM outputs neutral, all relays off.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pwm: [PWM_NEUTRAL; ACTUATOR_CHANNELS],
            relays: [RELAY_OFF; ACTUATOR_CHANNELS],
        }
    }

    fn slot(channel: usize) -> Option<usize> {
        (1..=ACTUATOR_CHANNELS).contains(&channel).then(|| channel - 1)
    }

    /// Set a PWM channel, clamping `value` to 0-255
    ///
    /// Returns `false` (and changes nothing) for channels outside 1-10.
    pub fn set_pwm(&mut self, channel: usize, value: i32) -> bool {
        match Self::slot(channel) {
            Some(slot) => {
                self.pwm[slot] = value.clamp(0, u8::MAX as i32) as u8;
                true
            }
            None => false,
        }
    }

    /// Switch a relay channel on or off
    ///
    /// Returns `false` (and changes nothing) for channels outside 1-10.
    pub fn set_relay(&mut self, channel: usize, on: bool) -> bool {
        match Self::slot(channel) {
            Some(slot) => {
                self.relays[slot] = if on { RELAY_ON } else { RELAY_OFF };
                true
            }
            None => false,
        }
    }

    /// Return every PWM output to neutral
    pub fn neutralize_pwm(&mut self) {
        self.pwm = [PWM_NEUTRAL; ACTUATOR_CHANNELS];
    }

    pub fn pwm(&self) -> &[u8; ACTUATOR_CHANNELS] {
        &self.pwm
    }

    pub fn relays(&self) -> &[u8; ACTUATOR_CHANNELS] {
        &self.relays
    }

    pub fn pwm_record(&self) -> ActuatorRecord {
        encode_pwm_record(&self.pwm)
    }

    pub fn relay_record(&self) -> ActuatorRecord {
        encode_relay_record(&self.relays)
    }
}
