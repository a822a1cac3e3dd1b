//! Cooperative cancellation.
//!
//! The operator side sets the flag; the worker samples it between
//! macro-steps, before every step pulse and at each actuator poll. The flag
//! is level-triggered and never cleared: recovery runs under a new token.

use static_assertions::assert_impl_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

assert_impl_all!(CancellationToken: Send, Sync, Clone);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    #[inline]
    pub fn request_cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
