//! # Serial Communication Module
//!
//! Handles the byte stream to the actuator co-processor.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Handing 14-byte PWM / relay records from the poll loop to a writer task
//!   through a bounded queue, so the poll loop never waits on the port
//! - Writing and flushing queued records in order

use bytes::Bytes;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{Result, RobotLinkError};

/// Co-processor baud rate
pub const COPROCESSOR_BAUD_RATE: u32 = 115_200;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
];

/// Sink for co-processor records
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorLink {
    /// Queue one complete record without waiting
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;
}

/// Poll-loop side of the serial queue
#[derive(Debug, Clone)]
pub struct SerialForwarder {
    tx: mpsc::Sender<Bytes>,
}

/// Create a forwarder and the receiver its writer task drains
///
/// `queue_depth` bounds how many records may wait for the port.
pub fn forwarder(queue_depth: usize) -> (SerialForwarder, mpsc::Receiver<Bytes>) {
    let (tx, rx) = mpsc::channel(queue_depth.max(1));
    (SerialForwarder { tx }, rx)
}

impl ActuatorLink for SerialForwarder {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.tx
            .try_send(Bytes::copy_from_slice(record))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    io::Error::new(io::ErrorKind::WouldBlock, "serial queue full")
                }
                mpsc::error::TrySendError::Closed(_) => {
                    io::Error::new(io::ErrorKind::BrokenPipe, "serial writer stopped")
                }
            })
    }
}

/// Drain queued records into `port` until every forwarder is dropped
///
/// # Returns
///
/// * `Result<u64>` - Number of records written
///
/// # Errors
///
/// Returns error on the first failed write or flush
pub async fn run_serial_writer<W>(mut port: W, mut rx: mpsc::Receiver<Bytes>) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;

    while let Some(record) = rx.recv().await {
        port.write_all(&record)
            .await
            .map_err(|e| RobotLinkError::Serial(format!("Failed to write record: {}", e)))?;

        port.flush()
            .await
            .map_err(|e| RobotLinkError::Serial(format!("Failed to flush serial port: {}", e)))?;

        written += 1;
        debug!("Sent co-processor record ({} bytes)", record.len());
    }

    info!("Serial writer stopped after {} records", written);
    Ok(written)
}

/// Serial connection to the co-processor
pub struct CoprocessorSerial {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for CoprocessorSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoprocessorSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl CoprocessorSerial {
    /// Open the first device path that works
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path if none could be opened
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened co-processor at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(RobotLinkError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| RobotLinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hand the stream to the writer task
    pub fn into_stream(self) -> tokio_serial::SerialStream {
        self.port
    }
}
