//! Pulse timing port.
//!
//! Every blocking wait in the motion layer goes through a `PulseScheduler`:
//! the step pulse holds and the actuator dwell. `SleepScheduler` blocks the
//! calling thread; `VirtualScheduler` only accumulates the time it was asked
//! to wait, which lets simulation runs and tests finish instantly.

use archimedes_common::hal::driver::{HalError, OutputDriver};
use archimedes_common::hal::types::{Level, PinId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Timing port for pulse emission.
pub trait PulseScheduler: Send + Sync {
    /// Block for `seconds` (or account for it in virtual time).
    fn hold(&self, seconds: f64);

    /// One step: pin HIGH, hold, pin LOW, hold.
    ///
    /// If the LOW write fails the pin may be left HIGH; the caller treats
    /// that as a port fault and stops.
    fn step(
        &self,
        port: &dyn OutputDriver,
        pin: PinId,
        half_period: f64,
    ) -> Result<(), HalError> {
        port.set_level(pin, Level::High)?;
        self.hold(half_period);
        port.set_level(pin, Level::Low)?;
        self.hold(half_period);
        Ok(())
    }
}

/// Real-time scheduler backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepScheduler;

impl PulseScheduler for SleepScheduler {
    fn hold(&self, seconds: f64) {
        if seconds > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

/// Virtual-time scheduler. Never blocks.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    elapsed_ns: AtomicU64,
    holds: AtomicU64,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time waited so far.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Relaxed))
    }

    /// Number of `hold()` calls so far.
    pub fn holds(&self) -> u64 {
        self.holds.load(Ordering::Relaxed)
    }
}

impl PulseScheduler for VirtualScheduler {
    fn hold(&self, seconds: f64) {
        if seconds > 0.0 {
            let ns = (seconds * 1e9).round() as u64;
            self.elapsed_ns.fetch_add(ns, Ordering::Relaxed);
        }
        self.holds.fetch_add(1, Ordering::Relaxed);
    }
}
