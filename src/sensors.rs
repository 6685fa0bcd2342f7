//! # Sensor Inputs
//!
//! Synchronous pin sampling used when publishing telemetry.

use std::collections::HashMap;

/// Shield pin numbers.
pub mod pins {
    pub const ANALOG0: u8 = 0;
    pub const ANALOG1: u8 = 1;
    pub const ANALOG2: u8 = 2;
    pub const ANALOG3: u8 = 3;
    pub const ANALOG4: u8 = 4;
    pub const ANALOG5: u8 = 5;
    pub const DIGITAL1: u8 = 7;
    pub const DIGITAL2: u8 = 6;
    pub const DIGITAL3: u8 = 5;
    pub const DIGITAL4: u8 = 4;
    pub const DIGITAL5: u8 = 3;
    pub const DIGITAL6: u8 = 2;
    pub const DIGITAL7: u8 = 9;
    pub const DIGITAL8: u8 = 8;
}

/// Pin sampling backend
pub trait SensorInputs {
    /// Sample an analog pin (at most 16 bits wide)
    fn analog_read(&mut self, pin: u8) -> u16;

    /// Sample a digital pin
    fn digital_read(&mut self, pin: u8) -> bool;
}

/// Backend for hosts without pins: every analog pin reads 0, every digital pin low
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensors;

impl SensorInputs for NoSensors {
    fn analog_read(&mut self, _pin: u8) -> u16 {
        0
    }

    fn digital_read(&mut self, _pin: u8) -> bool {
        false
    }
}

/// Backend returning preset values; unset pins read like [`NoSensors`]
#[derive(Debug, Clone, Default)]
pub struct FixedSensors {
    analog: HashMap<u8, u16>,
    digital: HashMap<u8, bool>,
    reads: usize,
}

impl FixedSensors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_analog(&mut self, pin: u8, value: u16) {
        self.analog.insert(pin, value);
    }

    pub fn set_digital(&mut self, pin: u8, value: bool) {
        self.digital.insert(pin, value);
    }

    /// Number of samples taken so far
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorInputs for FixedSensors {
    fn analog_read(&mut self, pin: u8) -> u16 {
        self.reads += 1;
        self.analog.get(&pin).copied().unwrap_or(0)
    }

    fn digital_read(&mut self, pin: u8) -> bool {
        self.reads += 1;
        self.digital.get(&pin).copied().unwrap_or(false)
    }
}
