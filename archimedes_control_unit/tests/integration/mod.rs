//! Shared rig and recording helpers.

mod cancellation;
mod cut_cycle;
mod faults;
mod sequencer_ops;

use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::error::MotionError;
use archimedes_control_unit::motion::pulse::{PulseScheduler, VirtualScheduler};
use archimedes_control_unit::observer::{ConfirmationPrompt, ProgressObserver, Prompt};
use archimedes_control_unit::sequencer::MotionSequencer;
use archimedes_hal::SimulationDriver;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// ── Rig ─────────────────────────────────────────────────────────────

/// Sequencer on a simulated port, powered up, at home.
pub struct Rig {
    pub config: Arc<MachineConfig>,
    pub sim: SimulationDriver,
    pub sequencer: MotionSequencer,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_scheduler(Arc::new(VirtualScheduler::new()))
    }

    /// Rig whose scheduler cancels `token` after `holds` waits.
    pub fn cancelling_after(holds: u64, token: &CancellationToken) -> Self {
        Self::with_scheduler(Arc::new(CancelAfter::new(holds, token)))
    }

    pub fn with_scheduler(scheduler: Arc<dyn PulseScheduler>) -> Self {
        let config = Arc::new(MachineConfig::default());
        let mut sim = SimulationDriver::with_journal_capacity(64);
        sim.init(&config.hal, &config.output_pins())
            .expect("claim pins");
        let sequencer = MotionSequencer::new(Arc::clone(&config), Arc::new(sim.clone()), scheduler)
            .expect("valid config");
        sequencer.power_up().expect("power up");
        Self {
            config,
            sim,
            sequencer,
        }
    }

    pub fn step_pin(&self, axis: AxisId) -> PinId {
        self.config.axes.get(axis).step_pin
    }

    /// Steps per inch on `axis`.
    pub fn steps_per_inch(&self, axis: AxisId) -> f64 {
        let cfg = self.config.axes.get(axis);
        f64::from(cfg.steps_per_revolution) * cfg.pitch_per_revolution
    }

    /// Bridge released and every step line LOW.
    pub fn assert_outputs_at_rest(&self) {
        for pin in self.config.actuator.bridge_pins() {
            assert_eq!(self.sim.level(pin), Some(Level::Low), "bridge pin {pin} energized");
        }
        for axis in AxisId::ALL {
            let pin = self.step_pin(axis);
            assert_eq!(self.sim.level(pin), Some(Level::Low), "step pin {pin} left HIGH");
        }
    }
}

// ── Schedulers ──────────────────────────────────────────────────────

/// Virtual-time scheduler that cancels a token after a number of holds.
pub struct CancelAfter {
    token: CancellationToken,
    remaining: AtomicU64,
}

impl CancelAfter {
    pub fn new(holds: u64, token: &CancellationToken) -> Self {
        Self {
            token: token.clone(),
            remaining: AtomicU64::new(holds),
        }
    }
}

impl PulseScheduler for CancelAfter {
    fn hold(&self, _seconds: f64) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.token.request_cancel();
        }
    }
}

// ── Observer ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Phase { phase: String, message: String },
    Complete(String),
    Cancelled(String),
    Error(MotionError),
}

/// Shared view of what an observer recorded.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Note>>>);

impl Journal {
    pub fn notes(&self) -> Vec<Note> {
        self.0.lock().clone()
    }

    pub fn completes(&self) -> usize {
        self.count(|n| matches!(n, Note::Complete(_)))
    }

    pub fn cancels(&self) -> usize {
        self.count(|n| matches!(n, Note::Cancelled(_)))
    }

    pub fn errors(&self) -> Vec<MotionError> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Error(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Messages reported under `phase`, in order.
    pub fn messages(&self, phase: &str) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Phase { phase: p, message } if p == phase => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Phase names in order of first appearance.
    pub fn phases(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for note in self.notes() {
            if let Note::Phase { phase, .. } = note {
                if seen.last() != Some(&phase) {
                    seen.push(phase);
                }
            }
        }
        seen
    }

    fn count(&self, f: impl Fn(&Note) -> bool) -> usize {
        self.0.lock().iter().filter(|n| f(n)).count()
    }

    fn push(&self, note: Note) {
        self.0.lock().push(note);
    }
}

type Hook = Box<dyn FnMut() + Send>;

/// Records every notification and runs hooks on matching phase messages.
#[derive(Default)]
pub struct RecordingObserver {
    journal: Journal,
    hooks: Vec<(&'static str, &'static str, Hook)>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Run `f` when `message` is reported under `phase`.
    pub fn on(
        mut self,
        phase: &'static str,
        message: &'static str,
        f: impl FnMut() + Send + 'static,
    ) -> Self {
        self.hooks.push((phase, message, Box::new(f)));
        self
    }

    pub fn cancel_on(
        self,
        phase: &'static str,
        message: &'static str,
        token: &CancellationToken,
    ) -> Self {
        let token = token.clone();
        self.on(phase, message, move || token.request_cancel())
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_phase_change(&mut self, phase: &str, message: &str) {
        self.journal.push(Note::Phase {
            phase: phase.to_string(),
            message: message.to_string(),
        });
        for (p, m, hook) in &mut self.hooks {
            if *p == phase && *m == message {
                hook();
            }
        }
    }

    fn on_complete(&mut self, title: &str, _message: &str) {
        self.journal.push(Note::Complete(title.to_string()));
    }

    fn on_cancelled(&mut self, _title: &str, message: &str) {
        self.journal.push(Note::Cancelled(message.to_string()));
    }

    fn on_error(&mut self, error: &MotionError) {
        self.journal.push(Note::Error(error.clone()));
    }
}

// ── Prompt ──────────────────────────────────────────────────────────

/// Answers from a script; "yes" once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    pub asked: Vec<Prompt>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

impl ConfirmationPrompt for ScriptedPrompt {
    fn confirm(&mut self, prompt: Prompt, token: &CancellationToken) -> bool {
        self.asked.push(prompt);
        self.answers.pop_front().unwrap_or(true) && !token.is_cancelled()
    }
}
