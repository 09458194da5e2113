//! Counters and flags shared between the fill loop and the completion path.
//!
//! # Contract
//!
//! - Each [`ChunkCounter`] has exactly ONE writer context. The fill counter is
//!   written by the fill loop; the drain counter by the completion handler.
//! - Any number of contexts may read. A read may observe a newer value on the
//!   next call, so callers must not cache it across a wait.
//!
//! Writes use `Release` ordering and reads use `Acquire`, so everything a
//! writer stored before bumping a counter (chunk samples, finished reads of a
//! chunk) is visible to a reader that observes the new value. The single-writer
//! contract lets `increment` use a plain load/store pair, which also works on
//! cores without atomic read-modify-write (Cortex-M0+).

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Monotonic chunk counter crossing an interrupt boundary.
///
/// Values wrap at `usize::MAX`; compare with `wrapping_sub`.
#[derive(Debug)]
pub struct ChunkCounter {
    count: AtomicUsize,
}

impl ChunkCounter {
    pub const fn new() -> Self {
        ChunkCounter {
            count: AtomicUsize::new(0),
        }
    }

    /// Current count.
    #[inline]
    pub fn load(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Add one and return the new count. Writer side only.
    #[inline]
    pub fn increment(&self) -> usize {
        let next = self.count.load(Ordering::Relaxed).wrapping_add(1);
        self.count.store(next, Ordering::Release);
        next
    }

    /// Publish an absolute count. Writer side only; `value` must not be behind
    /// the current count.
    #[inline]
    pub(crate) fn publish(&self, value: usize) {
        self.count.store(value, Ordering::Release);
    }
}

impl Default for ChunkCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative stop request, checked by the fill loop at the top of each cycle.
#[derive(Debug)]
pub struct StopSignal {
    requested: AtomicBool,
}

impl StopSignal {
    pub const fn new() -> Self {
        StopSignal {
            requested: AtomicBool::new(false),
        }
    }

    /// Ask the fill loop to return after its current cycle.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_zero_and_increments() {
        let counter = ChunkCounter::new();
        assert_eq!(counter.load(), 0);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.load(), 2);
    }

    #[test]
    fn counter_wraps() {
        let counter = ChunkCounter::new();
        counter.publish(usize::MAX);
        assert_eq!(counter.increment(), 0);
        assert_eq!(0usize.wrapping_sub(usize::MAX), 1);
    }

    #[test]
    fn publish_sets_absolute_value() {
        let counter = ChunkCounter::new();
        counter.publish(41);
        assert_eq!(counter.increment(), 42);
    }

    #[test]
    fn stop_signal() {
        let stop = StopSignal::new();
        assert!(!stop.is_requested());
        stop.request();
        assert!(stop.is_requested());
    }
}
