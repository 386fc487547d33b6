// src/busy.rs
// Counts in-flight daemon calls. Each call holds a guard; dropping it
// releases the slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct BusyTracker {
    count: Arc<AtomicUsize>,
}

impl BusyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one more call as in flight until the returned guard is dropped.
    #[must_use = "the call stops counting as busy once the guard is dropped"]
    pub fn enter(&self) -> BusyGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            count: Arc::clone(&self.count),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.count() > 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    count: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        // Floored at zero.
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_drop() {
        let busy = BusyTracker::new();
        assert!(!busy.is_busy());
        let guard = busy.enter();
        assert_eq!(busy.count(), 1);
        drop(guard);
        assert_eq!(busy.count(), 0);
    }

    #[test]
    fn overlapping_guards_release_independently() {
        let busy = BusyTracker::new();
        let a = busy.enter();
        let b = busy.clone().enter();
        assert_eq!(busy.count(), 2);
        drop(b);
        assert!(busy.is_busy());
        drop(a);
        assert!(!busy.is_busy());
    }

    #[test]
    fn release_is_floored_at_zero() {
        let busy = BusyTracker::new();
        let guard = busy.enter();
        busy.count.store(0, Ordering::SeqCst);
        drop(guard);
        assert_eq!(busy.count(), 0);
    }

    #[test]
    fn guard_released_when_unwinding() {
        let busy = BusyTracker::new();
        let tracker = busy.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = tracker.enter();
            panic!("call blew up");
        });
        assert!(result.is_err());
        assert_eq!(busy.count(), 0);
    }
}
