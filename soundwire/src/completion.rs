//! # Probe Completion
//!
//! One-shot gate released when a device finishes probing. Waiting is advisory:
//! a waiter that gives up does not cancel the probe in flight.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use core::time::Duration;

/// Monotonic time source used by [`Completion::wait_timeout`]
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary fixed origin
    fn now(&self) -> Duration;
}

/// One-shot completion
#[derive(Debug, Default)]
pub struct Completion {
    done: AtomicBool,
    releases: AtomicU32,
}

impl Completion {
    /// Create an unreleased completion
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            releases: AtomicU32::new(0),
        }
    }

    /// Release every waiter
    ///
    /// Returns `true` for the call that actually released the gate; later calls
    /// are no-ops until [`reinit`](Self::reinit).
    pub fn complete(&self) -> bool {
        let first = self
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.releases.fetch_add(1, Ordering::Relaxed);
        }
        first
    }

    /// Check if the gate has been released
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Number of times the gate was released since creation
    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Re-arm the gate for another bind
    pub fn reinit(&self) {
        self.done.store(false, Ordering::Release);
    }

    /// Spin until the gate is released
    pub fn wait(&self) {
        while !self.is_done() {
            core::hint::spin_loop();
        }
    }

    /// Spin until the gate is released or `timeout` elapses on `clock`
    ///
    /// Returns `false` on timeout; the caller must then treat the device as
    /// not yet probed.
    pub fn wait_timeout(&self, clock: &dyn Clock, timeout: Duration) -> bool {
        let deadline = clock.now().saturating_add(timeout);
        loop {
            if self.is_done() {
                return true;
            }
            if clock.now() >= deadline {
                return self.is_done();
            }
            core::hint::spin_loop();
        }
    }
}
