//! # Controller Module
//!
//! Operator input as delivered by the driver station.
//!
//! This module handles:
//! - Reading gamepad bundles out of the active control frame
//! - Scaling axes to PWM values with optional inversion
//! - Button and D-pad state with a released default when data is missing

pub mod joystick;

pub use joystick::{AxisMode, Joystick};
