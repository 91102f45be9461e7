//! Process-wide count of bytes held in raw storage

use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Bytes currently held by live raw regions.
#[must_use]
pub fn current() -> u64 {
    COUNTER.load(Ordering::SeqCst)
}

/// Registers `bytes` of freshly allocated raw memory and returns the new total.
pub fn increase(bytes: u64) -> u64 {
    COUNTER.fetch_add(bytes, Ordering::SeqCst).wrapping_add(bytes)
}

/// Unregisters `bytes` of released raw memory and returns the new total.
/// The counter never goes below zero.
pub fn decrease(bytes: u64) -> u64 {
    let mut prev = COUNTER.load(Ordering::SeqCst);
    loop {
        let next = prev.saturating_sub(bytes);
        match COUNTER.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
