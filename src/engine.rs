//! # Link Engine
//!
//! One [`RobotLink`] owns every piece of per-session state: the packet
//! exchange, the watchdog, the feedback frame under construction, the
//! actuator outputs and the address of the current driver station.
//!
//! ## Poll cycle
//!
//! 1. Receive at most one datagram into the exchange's receive slot
//! 2. Validate it; drop it silently if it fails
//! 3. Control frames: commit to the active slot, forward PWM and relay
//!    records to the co-processor, feed the watchdog
//! 4. Any valid frame: send the pending feedback frame back to its sender
//! 5. Re-evaluate the enable state
//!
//! Nothing here blocks. The caller decides the polling rate.

use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::actuator::ActuatorOutputs;
use crate::error::{AppendError, FrameError};
use crate::exchange::PacketExchange;
use crate::net::DatagramLink;
use crate::protocol::bundle::ActiveFrame;
use crate::protocol::decoder::decode_frame;
use crate::protocol::frame::{
    device_id, FeedbackHeader, MessageType, FIRMWARE_VERSION, PROTOCOL_VERSION,
};
use crate::sensors::SensorInputs;
use crate::serial::ActuatorLink;
use crate::telemetry::{LinkRecord, LinkStats, TelemetryAssembler};
use crate::watchdog::{EnableState, EnableWatchdog, DEFAULT_FRAME_TIMEOUT, DEFAULT_STARTUP_LOCKOUT};

/// Identity and timing of this controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub protocol_version: u8,
    pub device_id: u8,
    pub firmware_version: u8,
    pub frame_timeout: Duration,
    pub startup_lockout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            device_id: device_id::CONTROLLER,
            firmware_version: FIRMWARE_VERSION,
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
            startup_lockout: DEFAULT_STARTUP_LOCKOUT,
        }
    }
}

/// What one poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// Nothing was queued
    Idle,
    /// A control frame became the active frame
    Control,
    /// A valid non-control frame was answered with feedback
    Other(MessageType),
    /// A datagram failed validation and was dropped
    Rejected(FrameError),
    /// The socket reported an error
    TransportError,
}

/// Packet engine for one driver station session
pub struct RobotLink<D, A, S> {
    settings: LinkSettings,
    link: D,
    actuator_link: A,
    sensors: S,
    exchange: PacketExchange,
    watchdog: EnableWatchdog,
    telemetry: TelemetryAssembler,
    outputs: ActuatorOutputs,
    peer: Option<SocketAddr>,
    state: EnableState,
    stats: LinkStats,
}

impl<D, A, S> std::fmt::Debug for RobotLink<D, A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotLink")
            .field("settings", &self.settings)
            .field("peer", &self.peer)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<D, A, S> RobotLink<D, A, S>
where
    D: DatagramLink,
    A: ActuatorLink,
    S: SensorInputs,
{
    /// Create an engine whose uptime starts now.
    pub fn new(settings: LinkSettings, link: D, actuator_link: A, sensors: S) -> Self {
        Self::with_start(settings, link, actuator_link, sensors, Instant::now())
    }

    /// Create an engine whose uptime is measured from `started`.
    pub fn with_start(
        settings: LinkSettings,
        link: D,
        actuator_link: A,
        sensors: S,
        started: Instant,
    ) -> Self {
        Self {
            settings,
            link,
            actuator_link,
            sensors,
            exchange: PacketExchange::new(),
            watchdog: EnableWatchdog::with_timing(
                started,
                settings.frame_timeout,
                settings.startup_lockout,
            ),
            telemetry: TelemetryAssembler::new(),
            outputs: ActuatorOutputs::new(),
            peer: None,
            state: EnableState::Disabled,
            stats: LinkStats::default(),
        }
    }

    /// Run one cycle at the current time
    pub fn poll(&mut self) -> PollEvent {
        self.poll_at(Instant::now())
    }

    /// Run one cycle as if the clock read `now`
    pub fn poll_at(&mut self, now: Instant) -> PollEvent {
        let event = self.receive(now);
        self.update_state(now);
        event
    }

    fn receive(&mut self, now: Instant) -> PollEvent {
        match self.link.try_recv(self.exchange.receive_buffer()) {
            Ok(None) | Ok(Some((0, _))) => PollEvent::Idle,
            Ok(Some((len, from))) => self.handle_datagram(len, from, now),
            Err(e) => {
                warn!("Datagram receive failed: {}", e);
                PollEvent::TransportError
            }
        }
    }

    fn handle_datagram(&mut self, len: usize, from: SocketAddr, now: Instant) -> PollEvent {
        let header = match decode_frame(self.exchange.received(len), self.settings.protocol_version) {
            Ok(header) => header,
            Err(e) => {
                debug!("Dropped {} byte datagram from {}: {}", len, from, e);
                self.stats.record_rejection(&e);
                return PollEvent::Rejected(e);
            }
        };

        if self.peer != Some(from) {
            info!("Driver station at {} (device 0x{:02X})", from, header.device_id);
            self.peer = Some(from);
        }

        let event = if header.is_committable_control() {
            self.exchange.commit(header.len);
            self.forward_outputs();
            self.watchdog.feed(now);
            self.stats.control_frames += 1;
            trace!("Committed {} byte control frame", header.len);
            PollEvent::Control
        } else {
            self.stats.other_frames += 1;
            PollEvent::Other(header.message_type)
        };

        self.flush_at(now);
        event
    }

    fn forward_outputs(&mut self) {
        let records = [self.outputs.pwm_record(), self.outputs.relay_record()];
        for record in records.iter() {
            if let Err(e) = self.actuator_link.write_record(record) {
                warn!("Failed to forward actuator record: {}", e);
                self.stats.actuator_errors += 1;
            }
        }
    }

    fn update_state(&mut self, now: Instant) {
        let state = self.watchdog.state(now);
        if state != self.state {
            match state {
                EnableState::Enabled => info!("Robot enabled"),
                EnableState::Disabled => info!("Robot disabled"),
            }
            self.state = state;
        }
    }

    /// Send the feedback frame to the current driver station
    pub fn flush(&mut self) -> bool {
        self.flush_at(Instant::now())
    }

    /// Finalize and send the feedback frame as of `now`
    ///
    /// Returns `false` without touching the frame if no driver station has
    /// been heard from yet. Otherwise the frame is reset whether or not the
    /// socket accepted it.
    pub fn flush_at(&mut self, now: Instant) -> bool {
        let Some(peer) = self.peer else {
            trace!("No driver station yet, feedback held");
            return false;
        };

        let header = FeedbackHeader {
            protocol_version: self.settings.protocol_version,
            device_id: self.settings.device_id,
            firmware_version: self.settings.firmware_version,
            enabled: self.watchdog.is_enabled(now),
            uptime_minutes: FeedbackHeader::uptime_minutes_from(self.watchdog.uptime(now)),
        };

        let frame = self.telemetry.finalize(&header);
        let sent = match self.link.send_to(frame, peer) {
            Ok(_) => {
                self.stats.feedback_sent += 1;
                true
            }
            Err(e) => {
                warn!("Failed to send feedback to {}: {}", peer, e);
                self.stats.feedback_errors += 1;
                false
            }
        };

        self.telemetry.reset();
        sent
    }

    /// Freeze the feedback frame; appends are refused until the next send
    pub fn request_flush(&mut self) {
        self.telemetry.request_flush();
    }

    pub fn publish_u8(&mut self, bundle_id: u8, value: u8) -> Result<(), AppendError> {
        self.telemetry.append_u8(bundle_id, value)
    }

    pub fn publish_u16(&mut self, bundle_id: u8, value: u16) -> Result<(), AppendError> {
        self.telemetry.append_u16(bundle_id, value)
    }

    pub fn publish_i32(&mut self, bundle_id: u8, value: i32) -> Result<(), AppendError> {
        self.telemetry.append_i32(bundle_id, value)
    }

    /// Sample an analog pin and publish it as a 16-bit value
    ///
    /// The pin is not sampled if the value would be dropped.
    pub fn publish_analog(&mut self, pin: u8, bundle_id: u8) -> Result<(), AppendError> {
        self.telemetry.check(2)?;
        let value = self.sensors.analog_read(pin);
        self.telemetry.append_u16(bundle_id, value)
    }

    /// Sample a digital pin and publish it as 0xFF (high) or 0x00 (low)
    pub fn publish_digital(&mut self, pin: u8, bundle_id: u8) -> Result<(), AppendError> {
        self.telemetry.check(1)?;
        let value = if self.sensors.digital_read(pin) { 0xFF } else { 0x00 };
        self.telemetry.append_u8(bundle_id, value)
    }

    /// Set a PWM output (channels 1-10, value clamped to 0-255)
    pub fn set_pwm(&mut self, channel: usize, value: i32) -> bool {
        self.outputs.set_pwm(channel, value)
    }

    /// Set a relay output (channels 1-10)
    pub fn set_relay(&mut self, channel: usize, on: bool) -> bool {
        self.outputs.set_relay(channel, on)
    }

    pub fn outputs(&self) -> &ActuatorOutputs {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut ActuatorOutputs {
        &mut self.outputs
    }

    /// Last committed control frame
    pub fn active_frame(&self) -> ActiveFrame<'_> {
        self.exchange.active()
    }

    pub fn component_at(&self, bundle_id: u8, index: usize) -> Option<u8> {
        self.active_frame().component_at(bundle_id, index)
    }

    pub fn bundle_size(&self, bundle_id: u8) -> Option<usize> {
        self.active_frame().bundle_size(bundle_id)
    }

    /// Enable state as of the last poll
    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    pub fn state(&self) -> EnableState {
        self.state
    }

    pub fn last_control_frame(&self) -> Option<Instant> {
        self.watchdog.last_control_frame()
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        self.watchdog.uptime(now)
    }

    /// Current driver station, if any has been heard from
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn telemetry(&self) -> &TelemetryAssembler {
        &self.telemetry
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    /// Snapshot for the JSONL recorder
    pub fn snapshot(&self, now: Instant) -> LinkRecord {
        LinkRecord {
            timestamp: chrono::Utc::now(),
            uptime_ms: self.uptime(now).as_millis() as u64,
            enabled: self.is_enabled(),
            peer: self.peer.map(|peer| peer.to_string()),
            stats: self.stats,
        }
    }

    pub fn link(&self) -> &D {
        &self.link
    }

    pub fn actuator_link(&self) -> &A {
        &self.actuator_link
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }
}
