//! # Telemetry Module
//!
//! Everything that flows from the robot back to the operator.
//!
//! This module handles:
//! - Assembling feedback bundles into the next feedback frame
//! - Counting link events (accepted, rejected, sent)
//! - Writing periodic link snapshots to rotating JSONL files

pub mod assembler;
pub mod recorder;
pub mod stats;

pub use assembler::{FrameWriter, TelemetryAssembler};
pub use recorder::{LinkRecord, TelemetryRecorder};
pub use stats::LinkStats;
