//! Background cut worker.
//!
//! Runs at most one cut job at a time on its own thread so the operator
//! shell stays responsive. A second submission while a job is active is
//! rejected with [`MotionError::JobInProgress`].

use crate::cancel::CancellationToken;
use crate::error::MotionError;
use crate::observer::{ConfirmationPrompt, ProgressObserver};
use crate::sequencer::{JobOutcome, MotionSequencer};
use archimedes_common::cutter::request::CutRequest;
use parking_lot::Mutex;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Owns the sequencer and hands it to one job thread at a time.
#[derive(Clone)]
pub struct CutWorker {
    sequencer: Arc<Mutex<MotionSequencer>>,
    busy: Arc<AtomicBool>,
}

/// Handle on a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    token: CancellationToken,
    thread: JoinHandle<Result<JobOutcome, MotionError>>,
}

/// Clears the busy flag when the job thread exits, panics included.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CutWorker {
    pub fn new(sequencer: MotionSequencer) -> Self {
        Self {
            sequencer: Arc::new(Mutex::new(sequencer)),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `true` while a job thread is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start a cut job in the background.
    ///
    /// The request is checked against the travel limits before the thread
    /// starts.
    pub fn submit(
        &self,
        request: CutRequest,
        mut observer: Box<dyn ProgressObserver>,
        mut prompt: Box<dyn ConfirmationPrompt>,
    ) -> Result<JobHandle, MotionError> {
        request.check(&self.sequencer.lock().config().travel)?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MotionError::JobInProgress);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let token = CancellationToken::new();
        let job_token = token.clone();
        let sequencer = Arc::clone(&self.sequencer);

        let thread = thread::Builder::new()
            .name("cut-job".to_string())
            .spawn(move || {
                // Dropped after the sequencer lock is released.
                let _guard = guard;
                let mut sequencer = sequencer.lock();
                debug!("cut job thread started");
                sequencer.run_job(request, &job_token, observer.as_mut(), prompt.as_mut())
            })
            .map_err(|e| MotionError::invalid(format!("cannot start cut job thread: {e}")))?;

        info!(
            horizontal = request.horizontal_inches,
            vertical = request.vertical_inches,
            "cut job submitted"
        );
        Ok(JobHandle { token, thread })
    }

    /// Run `f` on the sequencer when no job is active.
    pub fn with_sequencer<R>(
        &self,
        f: impl FnOnce(&mut MotionSequencer) -> R,
    ) -> Result<R, MotionError> {
        if self.is_busy() {
            return Err(MotionError::JobInProgress);
        }
        let mut sequencer = self.sequencer.lock();
        Ok(f(&mut sequencer))
    }
}

impl JobHandle {
    /// Token observed by the job. Clones can cancel from any thread.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.request_cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Block until the job ends. A panic on the job thread is re-raised.
    pub fn wait(self) -> Result<JobOutcome, MotionError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
