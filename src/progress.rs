//! Progress reporting and cooperative cancellation for index construction.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Handle polled by the index builder between phases.
pub trait ProgressHandle: Sync {
    fn is_cancelled(&self) -> bool;
    fn set_total_steps(&self, total: usize);
    fn advance_step(&self);
}

/// Ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressHandle for NoProgress {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn set_total_steps(&self, _total: usize) {}

    fn advance_step(&self) {}
}

/// Thread-safe step counter with a cancellation flag that another thread may raise.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    cancelled: AtomicBool,
    total: AtomicUsize,
    done: AtomicUsize,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Acquire)
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }
}

impl ProgressHandle for ProgressCounter {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn set_total_steps(&self, total: usize) {
        self.total.store(total, Ordering::Release);
        self.done.store(0, Ordering::Release);
    }

    fn advance_step(&self) {
        self.done.fetch_add(1, Ordering::AcqRel);
    }
}

impl ProgressHandle for indicatif::ProgressBar {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn set_total_steps(&self, total: usize) {
        self.set_length(total as u64);
        self.set_position(0);
    }

    fn advance_step(&self) {
        self.inc(1);
    }
}
