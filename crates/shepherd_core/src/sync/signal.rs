//! # Connection Signals
//!
//! Two independent one-shot flags raised by any thread (usually the
//! transport's receive worker or the reconnection routine) and taken by the
//! simulation thread.
//!
//! Flags coalesce: raising "lost" twice before the loop samples it produces a
//! single loss event.

use std::sync::atomic::{AtomicBool, Ordering};

/// Connection-lost / connection-recovered one-shot flags.
#[derive(Debug, Default)]
pub struct ConnectionSignals {
    lost: AtomicBool,
    recovered: AtomicBool,
}

impl ConnectionSignals {
    /// Creates a pair of lowered flags.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lost: AtomicBool::new(false),
            recovered: AtomicBool::new(false),
        }
    }

    /// Reports that the peer went away.
    #[inline]
    pub fn raise_lost(&self) {
        self.lost.store(true, Ordering::Release);
    }

    /// Reports that the connection was re-established.
    #[inline]
    pub fn raise_recovered(&self) {
        self.recovered.store(true, Ordering::Release);
    }

    /// Checks and clears the lost flag.
    ///
    /// Returns true exactly once per raised occurrence.
    #[inline]
    pub fn take_lost(&self) -> bool {
        self.lost.swap(false, Ordering::AcqRel)
    }

    /// Checks and clears the recovered flag.
    #[inline]
    pub fn take_recovered(&self) -> bool {
        self.recovered.swap(false, Ordering::AcqRel)
    }

    /// Returns true if a loss is waiting to be handled.
    #[inline]
    #[must_use]
    pub fn is_lost_pending(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Returns true if a recovery is waiting to be handled.
    #[inline]
    #[must_use]
    pub fn is_recovery_pending(&self) -> bool {
        self.recovered.load(Ordering::Acquire)
    }

    /// Lowers both flags.
    pub fn clear(&self) {
        self.lost.store(false, Ordering::Release);
        self.recovered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_take_clears_flag() {
        let signals = ConnectionSignals::new();
        assert!(!signals.take_lost());

        signals.raise_lost();
        assert!(signals.is_lost_pending());
        assert!(signals.take_lost());
        assert!(!signals.take_lost());
    }

    #[test]
    fn test_raising_twice_coalesces() {
        let signals = ConnectionSignals::new();
        signals.raise_lost();
        signals.raise_lost();

        assert!(signals.take_lost());
        assert!(!signals.take_lost());
    }

    #[test]
    fn test_flags_are_independent() {
        let signals = ConnectionSignals::new();
        signals.raise_recovered();

        assert!(!signals.take_lost());
        assert!(signals.is_recovery_pending());
        assert!(signals.take_recovered());
    }

    #[test]
    fn test_raised_from_many_threads() {
        let signals = Arc::new(ConnectionSignals::new());
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let signals = Arc::clone(&signals);
                thread::spawn(move || signals.raise_lost())
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(signals.take_lost());
        assert!(!signals.take_lost());
    }
}
