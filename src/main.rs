//! # Robot Link
//!
//! Drive a robot from a remote driver station over UDP.
//!
//! This application listens for control frames, forwards actuator records to the
//! co-processor over serial and answers every valid frame with a feedback frame.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use robot_link::config::Config;
use robot_link::controller::joystick::axis;
use robot_link::controller::{AxisMode, Joystick};
use robot_link::engine::{PollEvent, RobotLink};
use robot_link::net::{DatagramLink, UdpLink};
use robot_link::sensors::{NoSensors, SensorInputs};
use robot_link::serial::{self, ActuatorLink, CoprocessorSerial};
use robot_link::telemetry::TelemetryRecorder;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Joystick bundle driving PWM channels 1-4
const DRIVE_JOYSTICK: u8 = 0x01;

/// Telemetry bundle carrying the enable state (0xFF enabled, 0x00 disabled)
const ENABLED_BUNDLE: u8 = 0x01;

/// Telemetry bundle carrying uptime in seconds
const UPTIME_BUNDLE: u8 = 0x02;

/// Upper bound on datagrams handled per poll tick
const MAX_DATAGRAMS_PER_TICK: usize = 8;

/// Main entry point for Robot Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, defaults if the file is missing)
///    - Set up logging with tracing subscriber
///    - Bind the UDP socket and open the co-processor serial port
///
/// 2. **Main Loop**
///    - Poll the link at `poll_rate_hz`
///    - Drive PWM 1-4 from the joystick axes while enabled, neutral otherwise
///    - Publish enable state and uptime for the next feedback frame
///    - Record link statistics every `log_interval_ms`
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - Configuration is invalid
/// - The UDP port cannot be bound
/// - Serial port cannot be opened
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let (config, loaded) = if Path::new(&config_path).exists() {
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load configuration from {}", config_path))?;
        (config, true)
    } else {
        (Config::default(), false)
    };

    let _log_guard = init_logging(&config.logging.log_dir);

    info!("Robot Link v{} starting...", env!("CARGO_PKG_VERSION"));
    if loaded {
        info!("Loaded configuration from {}", config_path);
    } else {
        warn!("{} not found, using default configuration", config_path);
    }

    let bind_addr = config.bind_addr()?;
    let udp = UdpLink::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    let coprocessor = CoprocessorSerial::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate)?;
    info!("Co-processor serial port opened at: {}", coprocessor.device_path());

    let (forwarder, rx) = serial::forwarder(config.serial.queue_depth);
    let writer = tokio::spawn(serial::run_serial_writer(coprocessor.into_stream(), rx));

    let mut recorder = if config.telemetry.enabled {
        Some(TelemetryRecorder::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        )?)
    } else {
        None
    };

    let mut link = RobotLink::new(config.link_settings(), udp, forwarder, NoSensors);

    let mut poll_interval = interval(config.poll_period());
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut record_interval = interval(Duration::from_millis(config.telemetry.log_interval_ms));
    record_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Polling driver station link at {}Hz", config.control.poll_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut poll_count: u64 = 0;

    loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                for _ in 0..MAX_DATAGRAMS_PER_TICK {
                    match link.poll() {
                        PollEvent::Idle | PollEvent::TransportError => break,
                        _ => {}
                    }
                }

                drive_outputs(&mut link);
                publish_status(&mut link, Instant::now());

                poll_count += 1;
                if poll_count % config.control.log_interval_polls == 0 {
                    let stats = link.stats();
                    info!(
                        "Polls: {}, control frames: {}, rejected: {}, enabled: {}",
                        poll_count,
                        stats.control_frames,
                        stats.rejected(),
                        link.is_enabled()
                    );
                }
            }

            _ = record_interval.tick(), if recorder.is_some() => {
                if let Some(recorder) = recorder.as_mut() {
                    if let Err(e) = recorder.record(&link.snapshot(Instant::now())) {
                        warn!("Failed to record link statistics: {}", e);
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total polls: {}, control frames: {}", poll_count, link.stats().control_frames);
                break;
            }
        }
    }

    // Dropping the engine drops the forwarder, which ends the writer task
    drop(link);
    match writer.await {
        Ok(Ok(written)) => debug!("Serial writer finished ({} records)", written),
        Ok(Err(e)) => error!("Serial writer failed: {}", e),
        Err(e) => error!("Serial writer task panicked: {}", e),
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// Logs go to stdout, and also to a daily rolling file when `log_dir` is set.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(log_dir: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(log_dir, "robot-link.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Map the drive joystick onto PWM 1-4 while enabled; hold neutral otherwise
fn drive_outputs<D, A, S>(link: &mut RobotLink<D, A, S>)
where
    D: DatagramLink,
    A: ActuatorLink,
    S: SensorInputs,
{
    if !link.is_enabled() {
        link.outputs_mut().neutralize_pwm();
        return;
    }

    let pad = Joystick::new(DRIVE_JOYSTICK);
    let values = {
        let frame = link.active_frame();
        [axis::LEFT_X, axis::LEFT_Y, axis::RIGHT_X, axis::RIGHT_Y]
            .map(|index| pad.make_pwm(&frame, index, AxisMode::Normal))
    };

    for (channel, value) in values.iter().enumerate() {
        link.set_pwm(channel + 1, i32::from(*value));
    }
}

/// Queue enable state and uptime once per feedback frame
fn publish_status<D, A, S>(link: &mut RobotLink<D, A, S>, now: Instant)
where
    D: DatagramLink,
    A: ActuatorLink,
    S: SensorInputs,
{
    if !link.telemetry().bundles().is_empty() {
        return;
    }

    let enabled = if link.is_enabled() { 0xFF } else { 0x00 };
    let uptime = i32::try_from(link.uptime(now).as_secs()).unwrap_or(i32::MAX);

    if let Err(e) = link
        .publish_u8(ENABLED_BUNDLE, enabled)
        .and_then(|_| link.publish_i32(UPTIME_BUNDLE, uptime))
    {
        debug!("Status telemetry skipped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_link::actuator::PWM_NEUTRAL;
    use robot_link::engine::LinkSettings;
    use std::io;
    use std::net::SocketAddr;

    struct IdleLink;

    impl DatagramLink for IdleLink {
        fn try_recv(&mut self, _buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
            Ok(None)
        }

        fn send_to(&mut self, frame: &[u8], _peer: SocketAddr) -> io::Result<usize> {
            Ok(frame.len())
        }
    }

    struct NullActuators;

    impl ActuatorLink for NullActuators {
        fn write_record(&mut self, _record: &[u8]) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bundle_constants() {
        assert_eq!(DRIVE_JOYSTICK, 0x01);
        assert_ne!(ENABLED_BUNDLE, UPTIME_BUNDLE);
        assert!(MAX_DATAGRAMS_PER_TICK > 0);
    }

    #[test]
    fn test_disabled_link_holds_neutral() {
        let mut link = RobotLink::new(LinkSettings::default(), IdleLink, NullActuators, NoSensors);
        link.set_pwm(1, 255);
        link.set_pwm(4, 0);

        drive_outputs(&mut link);

        assert!(link.outputs().pwm().iter().all(|&v| v == PWM_NEUTRAL));
    }

    #[test]
    fn test_status_published_once_per_frame() {
        let start = Instant::now();
        let mut link = RobotLink::with_start(
            LinkSettings::default(),
            IdleLink,
            NullActuators,
            NoSensors,
            start,
        );

        publish_status(&mut link, start + Duration::from_secs(90));
        assert_eq!(
            link.telemetry().bundles(),
            &[0x02, ENABLED_BUNDLE, 0x00, 0x05, UPTIME_BUNDLE, 0x00, 0x00, 0x00, 90]
        );

        publish_status(&mut link, start + Duration::from_secs(91));
        assert_eq!(link.telemetry().bundles().len(), 9);
    }
}
