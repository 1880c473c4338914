//! Process-wide counters for QSO progress and reply delivery.
use std::sync::atomic::{AtomicU64, Ordering};

static QSOS_STARTED: AtomicU64 = AtomicU64::new(0);
static QSOS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static IMPLICIT_RESETS: AtomicU64 = AtomicU64::new(0);
static REPLIES_DELIVERED: AtomicU64 = AtomicU64::new(0);
static REPLIES_CANCELLED: AtomicU64 = AtomicU64::new(0);

pub fn inc_qsos_started() {
    QSOS_STARTED.fetch_add(1, Ordering::Relaxed);
}

/// A QSO reached `ended`.
pub fn inc_qsos_completed() {
    QSOS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

/// A message arrived after a QSO ended and the bot started over.
pub fn inc_implicit_resets() {
    IMPLICIT_RESETS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_replies_delivered() {
    REPLIES_DELIVERED.fetch_add(1, Ordering::Relaxed);
}

pub fn add_replies_cancelled(n: u64) {
    REPLIES_CANCELLED.fetch_add(n, Ordering::Relaxed);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub qsos_started: u64,
    pub qsos_completed: u64,
    pub implicit_resets: u64,
    pub replies_delivered: u64,
    pub replies_cancelled: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        qsos_started: QSOS_STARTED.load(Ordering::Relaxed),
        qsos_completed: QSOS_COMPLETED.load(Ordering::Relaxed),
        implicit_resets: IMPLICIT_RESETS.load(Ordering::Relaxed),
        replies_delivered: REPLIES_DELIVERED.load(Ordering::Relaxed),
        replies_cancelled: REPLIES_CANCELLED.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Counters are global and other tests bump them concurrently, so only
    // assert that they move forward.
    #[test]
    fn counters_are_monotonic() {
        let before = snapshot();
        inc_qsos_started();
        inc_qsos_completed();
        add_replies_cancelled(2);
        let after = snapshot();
        assert!(after.qsos_started > before.qsos_started);
        assert!(after.qsos_completed > before.qsos_completed);
        assert!(after.replies_cancelled >= before.replies_cancelled + 2);
    }
}
