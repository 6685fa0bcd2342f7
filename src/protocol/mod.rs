//! # Driver Station Protocol Module
//!
//! Implementation of the datagram protocol spoken with the driver station.
//!
//! This module handles:
//! - Frame layout for control and feedback frames
//! - CRC16 checksum calculation
//! - Frame validation (length, version, CRC)
//! - Bundle lookup inside validated frames
//! - Actuator record encoding for the co-processor

pub mod frame;
pub mod encoder;
pub mod decoder;
pub mod bundle;
pub mod crc;
