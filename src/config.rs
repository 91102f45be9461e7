//! Process-wide tuning knobs

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use lazy_static::lazy_static;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::error::{LargeArrayError, Result};

/// Largest number of elements that may be copied into one native buffer by
/// the bulk extraction methods.
pub const LARGEST_SUBARRAY: i64 = 1 << 30;

/// Default capacity, in characters, of a string element.
pub const DEFAULT_MAX_STRING_LENGTH: i32 = 100;

/// Default capacity, in serialized bytes, of an object element.
pub const DEFAULT_MAX_OBJECT_SIZE: i32 = 1024;

const DEFAULT_LARGE_ARRAY_THRESHOLD: i64 = 1 << 30;
const DEFAULT_CONCURRENT_THRESHOLD: u64 = 100_000;

static LARGE_ARRAY_THRESHOLD: AtomicI64 = AtomicI64::new(DEFAULT_LARGE_ARRAY_THRESHOLD);
static CONCURRENT_THRESHOLD: AtomicU64 = AtomicU64::new(DEFAULT_CONCURRENT_THRESHOLD);

lazy_static! {
    static ref POOL: Option<ThreadPool> = ThreadPoolBuilder::new()
        .thread_name(|i| format!("largearrays-{}", i))
        .build()
        .map_err(|e| warn!(error = %e, "could not build worker pool, evaluating sequentially"))
        .ok();
}

/// Arrays longer than this many elements are backed by raw storage.
#[must_use]
pub fn large_array_threshold() -> i64 {
    LARGE_ARRAY_THRESHOLD.load(Ordering::Relaxed)
}

/// Changes the length above which newly created arrays use raw storage.
/// Existing arrays keep their storage.
pub fn set_large_array_threshold(threshold: i64) -> Result<()> {
    if threshold < 0 {
        return Err(LargeArrayError::invalid(
            "large array threshold cannot be negative",
        ));
    }
    LARGE_ARRAY_THRESHOLD.store(threshold, Ordering::Relaxed);
    Ok(())
}

/// Element count below which operators evaluate on the calling thread.
#[must_use]
pub fn concurrent_threshold() -> u64 {
    CONCURRENT_THRESHOLD.load(Ordering::Relaxed)
}

/// Changes the element count below which operators evaluate on the calling
/// thread. Zero is clamped to one.
pub fn set_concurrent_threshold(threshold: u64) {
    CONCURRENT_THRESHOLD.store(threshold.max(1), Ordering::Relaxed);
}

/// Number of workers the engine spreads large evaluations over.
#[must_use]
pub fn number_of_threads() -> usize {
    POOL.as_ref().map_or(1, ThreadPool::current_num_threads)
}

pub(crate) fn worker_pool() -> Option<&'static ThreadPool> {
    POOL.as_ref()
}
