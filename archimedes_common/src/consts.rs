//! Factory defaults of the panel cutter.
//!
//! These are the calibrated values of the production machine. Every section of
//! `machine.toml` falls back to them, so an empty file describes the stock
//! machine.

use crate::hal::types::PinId;

/// Canonical service name used for logging.
pub const SERVICE_NAME: &str = "archimedes";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/archimedes/machine.toml";

/// Default output driver.
pub const DEFAULT_DRIVER: &str = "simulation";

/// Default GPIO character device used by the "gpiod" driver.
pub const DEFAULT_GPIO_CHIP: &str = "gpiochip0";

/// Consumer label shown by the kernel for claimed lines.
pub const GPIO_CONSUMER: &str = "archimedes";

/// 40-pin header position to `gpiochip0` line offset on the controller
/// board (Raspberry Pi layout, where the offset is the BCM number).
pub const HEADER_LINES: &[(PinId, u32)] = &[
    (3, 2),
    (5, 3),
    (7, 4),
    (8, 14),
    (10, 15),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (19, 10),
    (21, 9),
    (22, 25),
    (23, 11),
    (24, 8),
    (26, 7),
    (27, 0),
    (28, 1),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

// ─── Ramp ───────────────────────────────────────────────────────────

/// Upper bound on the number of acceleration steps in a ramp.
pub const MAX_RAMP_STEPS: u64 = 200;

/// Lower bound on the number of acceleration steps in a ramp.
pub const MIN_RAMP_STEPS: u64 = 1;

// ─── Travel (inches) ────────────────────────────────────────────────

/// Full horizontal travel of the X carriage.
pub const MAX_HORIZONTAL: f64 = 46.0;
/// Full vertical travel of the Y carriage.
pub const MAX_VERTICAL: f64 = 41.0;
/// Smallest horizontal cut the machine accepts.
pub const MIN_HORIZONTAL: f64 = 12.0;
/// Smallest vertical cut the machine accepts.
pub const MIN_VERTICAL: f64 = 12.0;

/// Head plunge/raise distance.
pub const HEAD_JOG: f64 = 1.0;

// ─── X axis ─────────────────────────────────────────────────────────

pub const X_DIR_PIN: PinId = 11;
pub const X_STEP_PIN: PinId = 13;
pub const X_RPM: f64 = 200.0;
pub const X_STEPS_PER_REV: u32 = 200;
pub const X_PITCH: f64 = 4.0;
pub const X_RAMP_TIME: f64 = 3.0;

// ─── Y axis ─────────────────────────────────────────────────────────

pub const Y_DIR_PIN: PinId = 15;
pub const Y_STEP_PIN: PinId = 16;
pub const Y_RPM: f64 = 150.0;
pub const Y_STEPS_PER_REV: u32 = 200;
pub const Y_PITCH: f64 = 5.0;
pub const Y_RAMP_TIME: f64 = 3.0;

// ─── Z axis (cutting head) ──────────────────────────────────────────

pub const Z_DIR_PIN: PinId = 18;
pub const Z_STEP_PIN: PinId = 22;
pub const Z_RPM: f64 = 20.0;
pub const Z_STEPS_PER_REV: u32 = 200;
pub const Z_PITCH: f64 = 1.0;
pub const Z_RAMP_TIME: f64 = 0.5;

// ─── Linear actuator ────────────────────────────────────────────────

pub const A_SUPPLY_PIN: PinId = 31;
pub const A_ENABLE_PIN: PinId = 33;
pub const A_FORWARD_PIN: PinId = 36;
pub const A_REVERSE_PIN: PinId = 37;

/// Time the actuator needs for a full stroke, in seconds.
pub const A_DWELL_SECONDS: f64 = 13.0;

/// Cancellation polling interval during the actuator dwell, in seconds.
pub const A_POLL_SECONDS: f64 = 1.0;
