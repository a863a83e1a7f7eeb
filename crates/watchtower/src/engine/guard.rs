use std::sync::atomic::{AtomicBool, Ordering};

/// Holds the "cycle running" flag of one engine for the lifetime of a cycle.
///
/// Released on drop, so an early return or a panic inside the cycle never
/// leaves the engine locked.
pub(crate) struct CycleGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    /// `None` when another cycle already holds the flag.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
