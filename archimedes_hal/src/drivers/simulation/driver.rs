//! Simulation driver implementation.
//!
//! `SimulationDriver` is a cheap handle over shared state. The HAL owns one
//! clone as the `OutputDriver`; tests keep another to read the pin table,
//! walk the journal and arm fault injection while a job runs.

use archimedes_common::hal::config::HalConfig;
use archimedes_common::hal::driver::{DriverDiagnostics, HalError, OutputDriver};
use archimedes_common::hal::types::{Level, PinId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Default number of journal entries kept before the oldest are dropped.
const DEFAULT_JOURNAL_CAPACITY: usize = 65_536;

/// One recorded pin write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    /// Monotonic write number, starting at 0 after `init()`.
    pub seq: u64,
    /// Pin written.
    pub pin: PinId,
    /// Level driven.
    pub level: Level,
}

#[derive(Debug, Default)]
struct PinState {
    level: Level,
    rising_edges: u64,
}

#[derive(Debug)]
struct SimState {
    pins: HashMap<PinId, PinState>,
    released: bool,
    journal: VecDeque<PinWrite>,
    journal_capacity: usize,
    seq: u64,
    faults: u64,
    failing_pins: HashSet<PinId>,
    /// Successful writes left before a one-shot injected fault.
    fault_countdown: Option<u64>,
}

impl SimState {
    fn new(journal_capacity: usize) -> Self {
        Self {
            pins: HashMap::new(),
            released: false,
            journal: VecDeque::new(),
            journal_capacity,
            seq: 0,
            faults: 0,
            failing_pins: HashSet::new(),
            fault_countdown: None,
        }
    }

    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HalError> {
        if self.released || !self.pins.contains_key(&pin) {
            return Err(HalError::PinNotClaimed(pin));
        }
        if self.failing_pins.contains(&pin) {
            self.faults += 1;
            return Err(HalError::PortFault {
                pin,
                reason: "simulated line failure".to_string(),
            });
        }
        match self.fault_countdown {
            Some(0) => {
                self.fault_countdown = None;
                self.faults += 1;
                return Err(HalError::PortFault {
                    pin,
                    reason: "simulated transient fault".to_string(),
                });
            }
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        self.record(pin, level);
        Ok(())
    }

    fn record(&mut self, pin: PinId, level: Level) {
        let Some(state) = self.pins.get_mut(&pin) else {
            return;
        };
        if state.level == Level::Low && level == Level::High {
            state.rising_edges += 1;
        }
        state.level = level;

        if self.journal.len() == self.journal_capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(PinWrite {
            seq: self.seq,
            pin,
            level,
        });
        self.seq += 1;
    }
}

/// In-memory output driver.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    state: Arc<Mutex<SimState>>,
}

impl SimulationDriver {
    /// Create a new simulation driver instance.
    pub fn new() -> Self {
        Self::with_journal_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// Create a driver whose journal keeps at most `capacity` writes.
    pub fn with_journal_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::new(capacity.max(1)))),
        }
    }

    /// Make every write to `pin` fail until [`clear_faults`](Self::clear_faults).
    pub fn fail_pin(&self, pin: PinId) {
        self.state.lock().failing_pins.insert(pin);
    }

    /// Let `writes` more writes succeed, then fail exactly one.
    pub fn fail_after_writes(&self, writes: u64) {
        self.state.lock().fault_countdown = Some(writes);
    }

    /// Disarm all injected faults.
    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.failing_pins.clear();
        state.fault_countdown = None;
    }

    /// Current level of a claimed pin.
    pub fn level(&self, pin: PinId) -> Option<Level> {
        self.state.lock().pins.get(&pin).map(|p| p.level)
    }

    /// LOW-to-HIGH transitions seen on `pin`.
    pub fn rising_edges(&self, pin: PinId) -> u64 {
        self.state
            .lock()
            .pins
            .get(&pin)
            .map_or(0, |p| p.rising_edges)
    }

    /// Successful writes across all pins.
    pub fn total_writes(&self) -> u64 {
        self.state.lock().seq
    }

    /// Copy of the retained journal, oldest first.
    pub fn journal(&self) -> Vec<PinWrite> {
        self.state.lock().journal.iter().copied().collect()
    }

    /// Levels written to `pin`, oldest first, within the retained journal.
    pub fn writes_to(&self, pin: PinId) -> Vec<Level> {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|w| w.pin == pin)
            .map(|w| w.level)
            .collect()
    }

    /// Drop the journal. Pin levels and counters are kept.
    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    /// `true` once `shutdown()` released the pins.
    pub fn is_released(&self) -> bool {
        self.state.lock().released
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, _config: &HalConfig, pins: &[PinId]) -> Result<(), HalError> {
        let mut state = self.state.lock();
        state.pins = pins.iter().map(|&p| (p, PinState::default())).collect();
        if state.pins.len() != pins.len() {
            return Err(HalError::InitFailed(format!(
                "duplicate pins in claim list {pins:?}"
            )));
        }
        state.released = false;
        state.journal.clear();
        state.seq = 0;
        info!("Simulation driver initialized with {} output pins", pins.len());
        Ok(())
    }

    fn set_level(&self, pin: PinId, level: Level) -> Result<(), HalError> {
        let result = self.state.lock().write(pin, level);
        match &result {
            Ok(()) => trace!(pin, %level, "sim write"),
            Err(e) => warn!(pin, %level, "sim write rejected: {e}"),
        }
        result
    }

    fn shutdown(&self) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.released {
            return Ok(());
        }
        let mut claimed: Vec<PinId> = state.pins.keys().copied().collect();
        claimed.sort_unstable();
        // Injected faults model the hardware path; releasing lines always succeeds.
        for pin in claimed {
            state.record(pin, Level::Low);
        }
        state.released = true;
        debug!(writes = state.seq, faults = state.faults, "Simulation driver released");
        Ok(())
    }

    fn diagnostics(&self) -> Option<DriverDiagnostics> {
        let state = self.state.lock();
        Some(DriverDiagnostics {
            writes: state.seq,
            faults: state.faults,
            claimed_pins: state.pins.len(),
        })
    }
}
