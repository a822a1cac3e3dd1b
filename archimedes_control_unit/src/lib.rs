//! # Archimedes Control Unit Library
//!
//! Motion core of the panel cutter. Converts linear travel requests into
//! timed step pulses, drives the open-loop actuator and sequences both into
//! complete horizontal/vertical cut jobs with homing and cancellation.
//!
//! ## Layers
//!
//! 1. **RampProfile**: pure step-interval generation
//! 2. **AxisDriver / ActuatorDriver**: pin-level execution on the HAL port
//! 3. **MotionSequencer**: macro-operations and the cut job state machine
//! 4. **CutWorker**: one job at a time on a dedicated thread
//!
//! Axes are always driven one at a time. Every blocking wait (pulse hold,
//! actuator dwell) goes through a [`motion::pulse::PulseScheduler`], so the
//! whole stack runs in virtual time under test.

pub mod cancel;
pub mod error;
pub mod motion;
pub mod observer;
pub mod sequencer;
pub mod state;
pub mod worker;
