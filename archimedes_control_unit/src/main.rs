//! # Archimedes
//!
//! Operator CLI for the panel cutter. Loads `machine.toml`, brings up the
//! configured output driver and runs one operation: a full cut job, a jog,
//! an actuator stroke, homing or the demo pattern.
//!
//! Ctrl-C cancels the running operation; the machine is brought home before
//! the process exits.

use archimedes_common::consts::DEFAULT_CONFIG_PATH;
use archimedes_common::prelude::*;
use archimedes_control_unit::cancel::CancellationToken;
use archimedes_control_unit::motion::pulse::{PulseScheduler, SleepScheduler, VirtualScheduler};
use archimedes_control_unit::observer::{
    AutoConfirm, ConfirmationPrompt, LogObserver, PromptHandle, prompt_channel,
};
use archimedes_control_unit::sequencer::{JobOutcome, MotionSequencer, StepOutcome};
use archimedes_control_unit::worker::{CutWorker, JobHandle};
use archimedes_hal::{DriverRegistry, HalCore};
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Interval at which waiting loops re-check cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Archimedes panel cutter control
#[derive(Parser, Debug)]
#[command(name = "archimedes")]
#[command(version)]
#[command(about = "Panel cutter motion control: cut jobs, jogging and homing")]
struct Args {
    /// Path to machine.toml (default: /etc/archimedes/machine.toml).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the output driver from the config ("simulation", "gpiod").
    #[arg(long, global = true)]
    driver: Option<String>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long, global = true)]
    json: bool,

    /// Account for pulse and dwell timing without sleeping.
    #[arg(long, global = true)]
    fast: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut a panel of the given size (inches).
    Cut {
        horizontal: f64,
        vertical: f64,
        /// Answer "yes" to every operator prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Move one axis by a direction code (x: r/l, y: d/u, z: i/o).
    Jog {
        axis: AxisId,
        code: String,
        inches: f64,
        #[arg(long)]
        rpm: Option<f64>,
    },
    /// Full actuator stroke ("o" extend, "i" retract).
    Actuator { code: String },
    /// Raise the head and return Y then X by the given distances.
    Home { x: f64, y: f64 },
    /// Trace the demo square.
    Demo {
        #[arg(long, default_value_t = 1)]
        cycles: u32,
        #[arg(long, default_value_t = 6.0)]
        distance: f64,
        #[arg(long)]
        rpm: Option<f64>,
    },
}

/// Token of the operation Ctrl-C should cancel.
type ActiveToken = Arc<Mutex<Option<CancellationToken>>>;

fn main() {
    let args = Args::parse();
    let loaded = resolve_config(&args);

    let level = loaded
        .as_ref()
        .map(|(config, _)| config.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("Archimedes v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok((config, defaulted)) => {
            if defaulted {
                warn!("{DEFAULT_CONFIG_PATH} not found, using built-in machine defaults");
            }
            config
        }
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    };

    match run(&args, config) {
        Ok(true) => info!("Archimedes shutdown complete"),
        Ok(false) => {
            error!("Operation failed, see log above");
            process::exit(1);
        }
        Err(e) => {
            error!("FATAL: {e}");
            process::exit(1);
        }
    }
}

/// Load the machine config. A missing default file falls back to the
/// built-in defaults (second element `true`); an explicit path must exist.
fn resolve_config(args: &Args) -> Result<(MachineConfig, bool), ConfigError> {
    let (mut config, defaulted) = match &args.config {
        Some(path) => (load_machine_config(path)?, false),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                (load_machine_config(path)?, false)
            } else {
                (MachineConfig::default(), true)
            }
        }
    };
    if let Some(driver) = &args.driver {
        config.hal.driver = driver.clone();
    }
    Ok((config, defaulted))
}

/// Returns `Ok(false)` when the operation ended in a fault.
fn run(args: &Args, config: MachineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let config = Arc::new(config);
    let registry = DriverRegistry::with_builtin_drivers();
    let hal = HalCore::new(&config, &registry)?;
    info!(
        "HAL ready: driver={}, pins={:?}",
        hal.driver_name(),
        hal.claimed_pins()
    );

    let scheduler: Arc<dyn PulseScheduler> = if args.fast {
        Arc::new(VirtualScheduler::new())
    } else {
        Arc::new(SleepScheduler)
    };
    let sequencer = MotionSequencer::new(Arc::clone(&config), hal.port(), scheduler)?;
    sequencer.power_up()?;
    let worker = CutWorker::new(sequencer);

    let active: ActiveToken = Arc::new(Mutex::new(None));
    let handler_active = Arc::clone(&active);
    ctrlc::set_handler(move || {
        if let Some(token) = handler_active.lock().as_ref() {
            warn!("Received interrupt, cancelling");
            token.request_cancel();
        } else {
            info!("Received interrupt, nothing to cancel");
        }
    })?;

    let result = dispatch(&args.command, &worker, &active);

    // Outputs to rest before the port is released.
    match worker.with_sequencer(|s| s.shutdown()) {
        Ok(Err(e)) => warn!("Sequencer shutdown: {e}"),
        Err(e) => warn!("Sequencer still busy at shutdown: {e}"),
        Ok(Ok(())) => {}
    }
    if let Some(diag) = hal.diagnostics() {
        info!(
            "Port diagnostics: writes={}, faults={}",
            diag.writes, diag.faults
        );
    }
    hal.shutdown()?;
    result
}

fn dispatch(
    command: &Command,
    worker: &CutWorker,
    active: &ActiveToken,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Command::Cut {
            horizontal,
            vertical,
            yes,
        } => run_cut(worker, active, CutRequest::new(*horizontal, *vertical), *yes),
        Command::Jog {
            axis,
            code,
            inches,
            rpm,
        } => {
            let token = arm(active);
            let report =
                worker.with_sequencer(|s| s.jog(*axis, code, *inches, *rpm, &token))??;
            info!(
                "Jog {axis}: {} of {} steps{}",
                report.steps_executed,
                report.total_steps,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            Ok(true)
        }
        Command::Actuator { code } => {
            let token = arm(active);
            let report = worker.with_sequencer(|s| s.test_actuator(code, &token))??;
            info!(
                "Actuator {}: {:.1}s energized{}",
                report.direction,
                report.energized_seconds,
                if report.cancelled { " (cancelled)" } else { "" }
            );
            Ok(true)
        }
        Command::Home { x, y } => {
            let token = arm(active);
            let outcome =
                worker.with_sequencer(|s| s.home(*x, *y, &token, &mut LogObserver))??;
            if outcome == StepOutcome::Cancelled {
                warn!("Homing cancelled, position is no longer known");
            }
            Ok(true)
        }
        Command::Demo {
            cycles,
            distance,
            rpm,
        } => {
            let token = arm(active);
            let done = worker
                .with_sequencer(|s| s.demo(*cycles, *distance, *rpm, &token, &mut LogObserver))??;
            info!("Demo finished {done} of {cycles} cycles");
            Ok(true)
        }
    }
}

/// Fresh token wired to Ctrl-C.
fn arm(active: &ActiveToken) -> CancellationToken {
    let token = CancellationToken::new();
    *active.lock() = Some(token.clone());
    token
}

fn run_cut(
    worker: &CutWorker,
    active: &ActiveToken,
    request: CutRequest,
    yes: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (prompt, operator): (Box<dyn ConfirmationPrompt>, Option<PromptHandle>) = if yes {
        (Box::new(AutoConfirm), None)
    } else {
        let (prompt, handle) = prompt_channel(POLL_INTERVAL);
        (Box::new(prompt), Some(handle))
    };

    let job = worker.submit(request, Box::new(LogObserver), prompt)?;
    *active.lock() = Some(job.token());

    if let Some(operator) = operator {
        serve_operator(&job, &operator, &spawn_stdin_reader());
    }

    let outcome = job.wait()?;
    *active.lock() = None;
    match outcome {
        JobOutcome::Completed => Ok(true),
        JobOutcome::Cancelled { recovery, homed } => {
            info!("Cut cancelled ({recovery}), homed={homed}");
            Ok(true)
        }
        JobOutcome::Faulted { error, recovery } => {
            error!("Cut faulted ({recovery}): {error}");
            Ok(false)
        }
    }
}

/// Relay prompts to the terminal until the job thread exits.
fn serve_operator(job: &JobHandle, operator: &PromptHandle, lines: &Receiver<String>) {
    let token = job.token();
    while !job.is_finished() {
        let Some(prompt) = operator.next_prompt(POLL_INTERVAL) else {
            continue;
        };
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();
        operator.answer(read_answer(lines, &token));
    }
}

/// Wait for a y/n line. EOF and cancellation count as "no".
fn read_answer(lines: &Receiver<String>, token: &CancellationToken) -> bool {
    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                return matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes");
            }
            Err(RecvTimeoutError::Timeout) if !token.is_cancelled() => {}
            Err(_) => return false,
        }
    }
}

/// Stdin lines on a channel, so a blocked read never holds up cancellation.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive.parse() {
        filter = filter.add_directive(directive);
    }

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
