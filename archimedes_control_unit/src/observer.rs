//! Progress notifications and operator confirmation.
//!
//! The sequencer reports through a [`ProgressObserver`] and blocks on a
//! [`ConfirmationPrompt`] between the two cuts. Channel-backed
//! implementations let the worker thread talk to an operator shell running
//! elsewhere.

use crate::cancel::CancellationToken;
use crate::error::MotionError;
use core::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::{error, info, warn};

/// Progress sink for a running job.
///
/// Every terminal outcome produces exactly one of `on_complete`,
/// `on_cancelled` or `on_error`.
pub trait ProgressObserver: Send {
    fn on_phase_change(&mut self, phase: &str, message: &str);
    fn on_complete(&mut self, title: &str, message: &str);
    fn on_cancelled(&mut self, title: &str, message: &str);
    fn on_error(&mut self, error: &MotionError);
}

/// Operator questions asked between the cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Asked after the horizontal cut.
    RemoveScrap,
    /// Asked before the vertical cut.
    ContinueVertical,
}

impl Prompt {
    pub const fn question(self) -> &'static str {
        match self {
            Self::RemoveScrap => "Remove scrap and continue?",
            Self::ContinueVertical => "Proceed with vertical cut?",
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.question())
    }
}

/// Blocking yes/no question.
pub trait ConfirmationPrompt: Send {
    /// `true` to go on. Implementations return `false` once `token` is
    /// cancelled.
    fn confirm(&mut self, prompt: Prompt, token: &CancellationToken) -> bool;
}

// ─── Simple implementations ─────────────────────────────────────────

/// Answers "yes" to everything unless cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmationPrompt for AutoConfirm {
    fn confirm(&mut self, prompt: Prompt, token: &CancellationToken) -> bool {
        info!("{prompt} yes (auto)");
        !token.is_cancelled()
    }
}

/// Observer that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_phase_change(&mut self, phase: &str, message: &str) {
        info!(phase, "{message}");
    }

    fn on_complete(&mut self, title: &str, message: &str) {
        info!("{title}: {message}");
    }

    fn on_cancelled(&mut self, title: &str, message: &str) {
        warn!("{title}: {message}");
    }

    fn on_error(&mut self, error: &MotionError) {
        error!("Cut failed: {error}");
    }
}

// ─── Channel-backed implementations ─────────────────────────────────

/// Notification sent by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PhaseChange { phase: String, message: String },
    Complete { title: String, message: String },
    Cancelled { title: String, message: String },
    Error(MotionError),
}

impl ProgressEvent {
    /// `true` for the single terminal notification of a job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::PhaseChange { .. })
    }
}

/// Forwards notifications over a channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_phase_change(&mut self, phase: &str, message: &str) {
        self.send(ProgressEvent::PhaseChange {
            phase: phase.to_string(),
            message: message.to_string(),
        });
    }

    fn on_complete(&mut self, title: &str, message: &str) {
        self.send(ProgressEvent::Complete {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn on_cancelled(&mut self, title: &str, message: &str) {
        self.send(ProgressEvent::Cancelled {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn on_error(&mut self, error: &MotionError) {
        self.send(ProgressEvent::Error(error.clone()));
    }
}

/// Worker side of a prompt channel.
#[derive(Debug)]
pub struct ChannelPrompt {
    requests: Sender<Prompt>,
    answers: Receiver<bool>,
    poll: Duration,
}

/// Operator side of a prompt channel.
#[derive(Debug)]
pub struct PromptHandle {
    requests: Receiver<Prompt>,
    answers: Sender<bool>,
}

/// Create a connected prompt pair. The worker re-checks its token every
/// `poll` while waiting for an answer.
pub fn prompt_channel(poll: Duration) -> (ChannelPrompt, PromptHandle) {
    let (req_tx, req_rx) = mpsc::channel();
    let (ans_tx, ans_rx) = mpsc::channel();
    (
        ChannelPrompt {
            requests: req_tx,
            answers: ans_rx,
            poll,
        },
        PromptHandle {
            requests: req_rx,
            answers: ans_tx,
        },
    )
}

impl ConfirmationPrompt for ChannelPrompt {
    fn confirm(&mut self, prompt: Prompt, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return false;
        }
        // Answers to an earlier prompt that arrived late.
        while self.answers.try_recv().is_ok() {}

        if self.requests.send(prompt).is_err() {
            warn!("{prompt} no operator connected, treating as no");
            return false;
        }
        loop {
            match self.answers.recv_timeout(self.poll) {
                Ok(answer) => return answer && !token.is_cancelled(),
                Err(RecvTimeoutError::Timeout) => {
                    if token.is_cancelled() {
                        return false;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("{prompt} operator disconnected, treating as no");
                    return false;
                }
            }
        }
    }
}

impl PromptHandle {
    /// Next pending question, waiting at most `timeout`.
    pub fn next_prompt(&self, timeout: Duration) -> Option<Prompt> {
        self.requests.recv_timeout(timeout).ok()
    }

    /// Answer the outstanding question.
    pub fn answer(&self, yes: bool) {
        let _ = self.answers.send(yes);
    }
}
