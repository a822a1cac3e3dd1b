//! gpiod driver implementation.

use archimedes_common::consts::GPIO_CONSUMER;
use archimedes_common::hal::config::HalConfig;
use archimedes_common::hal::driver::{DriverDiagnostics, HalError, OutputDriver};
use archimedes_common::hal::types::{Level, PinId};
use gpiod::{Chip, Lines, Options, Output};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn};

/// A requested output line and the offset it was requested at.
struct ClaimedLine {
    offset: u32,
    request: Lines<Output>,
}

/// Output driver over a GPIO character device.
pub struct GpiodDriver {
    /// Requested lines, keyed by header pin.
    lines: Mutex<BTreeMap<PinId, ClaimedLine>>,
    writes: AtomicU64,
    faults: AtomicU64,
}

impl GpiodDriver {
    /// Create a driver with no lines requested.
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BTreeMap::new()),
            writes: AtomicU64::new(0),
            faults: AtomicU64::new(0),
        }
    }
}

impl Default for GpiodDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate header pins to chip line offsets.
///
/// # Errors
/// `HalError::InitFailed` if a pin has no entry in `line_map` or is listed
/// twice in `pins`.
pub fn resolve_lines(config: &HalConfig, pins: &[PinId]) -> Result<Vec<(PinId, u32)>, HalError> {
    let mut resolved: Vec<(PinId, u32)> = Vec::with_capacity(pins.len());
    for &pin in pins {
        if resolved.iter().any(|&(p, _)| p == pin) {
            return Err(HalError::InitFailed(format!("header pin {pin} claimed twice")));
        }
        let line = config.line_for(pin).ok_or_else(|| {
            HalError::InitFailed(format!(
                "header pin {pin} has no line on {} in hal.line_map",
                config.chip
            ))
        })?;
        resolved.push((pin, line));
    }
    Ok(resolved)
}

impl OutputDriver for GpiodDriver {
    fn name(&self) -> &'static str {
        "gpiod"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &HalConfig, pins: &[PinId]) -> Result<(), HalError> {
        let resolved = resolve_lines(config, pins)?;

        let chip = Chip::new(&config.chip)
            .map_err(|e| HalError::InitFailed(format!("open GPIO chip '{}': {e}", config.chip)))?;

        let mut lines = BTreeMap::new();
        for (pin, offset) in resolved {
            let options = Options::output([offset])
                .values([false])
                .consumer(GPIO_CONSUMER);
            let request = chip.request_lines(options).map_err(|e| {
                HalError::InitFailed(format!("request line {offset} (header pin {pin}): {e}"))
            })?;
            debug!(pin, line = offset, "gpio line requested as output");
            lines.insert(pin, ClaimedLine { offset, request });
        }
        *self.lines.lock() = lines;

        info!(
            "gpiod driver initialized on {} with {} output lines",
            config.chip,
            pins.len()
        );
        Ok(())
    }

    fn set_level(&self, pin: PinId, level: Level) -> Result<(), HalError> {
        let mut lines = self.lines.lock();
        let line = lines.get_mut(&pin).ok_or(HalError::PinNotClaimed(pin))?;
        match line.request.set_values([level.is_high()]) {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                trace!(pin, line = line.offset, %level, "gpio write");
                Ok(())
            }
            Err(e) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                Err(HalError::PortFault {
                    pin,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn shutdown(&self) -> Result<(), HalError> {
        // Dropping a request releases its line back to the kernel.
        let lines = std::mem::take(&mut *self.lines.lock());
        let mut first_error = None;
        for (pin, line) in lines {
            if let Err(e) = line.request.set_values([false]) {
                warn!(pin, line = line.offset, "failed to drive gpio LOW on shutdown: {e}");
                first_error.get_or_insert(HalError::PortFault {
                    pin,
                    reason: e.to_string(),
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        Some(DriverDiagnostics {
            writes: self.writes.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            claimed_pins: self.lines.lock().len(),
        })
    }
}
