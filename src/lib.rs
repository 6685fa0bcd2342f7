//! # Robot Link Library
//!
//! Controller-side packet engine for driving a robot from a remote driver station.
//!
//! This library receives CRC-protected control frames over UDP, keeps the latest
//! valid frame available for bundle lookups, gates the robot's enable state on
//! link freshness, forwards actuator records to a serial co-processor and sends
//! telemetry back to the driver station.

pub mod actuator;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod net;
pub mod protocol;
pub mod sensors;
pub mod serial;
pub mod telemetry;
pub mod watchdog;
