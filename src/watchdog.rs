//! # Enable Watchdog
//!
//! The robot is enabled only while control frames keep arriving, and never
//! during the first moments after start-up.
//!
//! The state is recomputed from timestamps on every poll; nothing latches.

use std::time::{Duration, Instant};

/// Maximum age of the last control frame for the robot to stay enabled
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_millis(250);

/// Uptime before which the robot is always disabled
pub const DEFAULT_STARTUP_LOCKOUT: Duration = Duration::from_millis(500);

/// Derived robot state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableState {
    Disabled,
    Enabled,
}

impl EnableState {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Tracks control frame arrival and derives [`EnableState`]
#[derive(Debug, Clone)]
pub struct EnableWatchdog {
    started: Instant,
    last_control_frame: Option<Instant>,
    frame_timeout: Duration,
    startup_lockout: Duration,
}

impl EnableWatchdog {
    /// Creates a watchdog with the default 250 ms timeout and 500 ms lockout.
    pub fn new(started: Instant) -> Self {
        Self::with_timing(started, DEFAULT_FRAME_TIMEOUT, DEFAULT_STARTUP_LOCKOUT)
    }

    pub fn with_timing(started: Instant, frame_timeout: Duration, startup_lockout: Duration) -> Self {
        Self {
            started,
            last_control_frame: None,
            frame_timeout,
            startup_lockout,
        }
    }

    /// Record an accepted control frame
    pub fn feed(&mut self, now: Instant) {
        self.last_control_frame = Some(now);
    }

    pub fn last_control_frame(&self) -> Option<Instant> {
        self.last_control_frame
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// Evaluate the state at `now`
    pub fn state(&self, now: Instant) -> EnableState {
        evaluate(
            now,
            self.last_control_frame,
            self.started,
            self.frame_timeout,
            self.startup_lockout,
        )
    }

    pub fn is_enabled(&self, now: Instant) -> bool {
        self.state(now).is_enabled()
    }
}

/// Pure enable rule
///
/// Enabled iff a control frame arrived no more than `frame_timeout` ago and
/// uptime is strictly past `startup_lockout`.
pub fn evaluate(
    now: Instant,
    last_control_frame: Option<Instant>,
    started: Instant,
    frame_timeout: Duration,
    startup_lockout: Duration,
) -> EnableState {
    let uptime = now.saturating_duration_since(started);
    if uptime <= startup_lockout {
        return EnableState::Disabled;
    }

    match last_control_frame {
        Some(last) if now.saturating_duration_since(last) <= frame_timeout => EnableState::Enabled,
        _ => EnableState::Disabled,
    }
}
