//! Worker session
//!
//! Process-wide state of the worker:
//! - Worker identity attached to every report
//! - Single-flight guard ensuring at most one job is in flight

use std::sync::atomic::{AtomicBool, Ordering};

/// State shared for the whole lifetime of the worker process
#[derive(Debug)]
pub struct WorkerSession {
    worker_id: String,

    /// True exactly while a cycle is claiming or processing a job
    busy: AtomicBool,
}

impl WorkerSession {
    /// Creates a new idle session
    pub fn new(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            busy: AtomicBool::new(false),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Returns whether a cycle currently holds the guard
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Acquires the single-flight guard
    ///
    /// Returns `None` when another cycle already holds it. The guard is
    /// released when the returned value is dropped, on every exit path.
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { session: self })
    }
}

/// Scoped hold on the single-flight guard
#[derive(Debug)]
pub struct FlightGuard<'a> {
    session: &'a WorkerSession,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::Release);
    }
}
