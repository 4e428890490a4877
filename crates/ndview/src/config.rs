use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Contiguous runs shorter than this stay on the calling thread.
pub const MIN_SIZE_FOR_PARALLELISM: usize = 1 << 16;

/// Overrides [`MIN_SIZE_FOR_PARALLELISM`] when set to a positive integer.
pub const MIN_SIZE_FOR_PARALLELISM_ENV: &str = "NDVIEW_MIN_SIZE_FOR_PARALLELISM";

lazy_static::lazy_static! {
    static ref PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(threshold_from_env());
}

fn threshold_from_env() -> usize {
    match std::env::var(MIN_SIZE_FOR_PARALLELISM_ENV) {
        Ok(raw) => match usize::from_str(raw.trim()) {
            Ok(n) if n > 0 => n,
            _ => {
                log::warn!(
                    "ignoring {}={:?}, expected a positive integer",
                    MIN_SIZE_FOR_PARALLELISM_ENV,
                    raw
                );
                MIN_SIZE_FOR_PARALLELISM
            }
        },
        Err(_) => MIN_SIZE_FOR_PARALLELISM,
    }
}

/// Smallest contiguous lane the `parallel` feature splits across the rayon pool.
pub fn min_size_for_parallelism() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Replaces the threshold for the rest of the process. Zero is clamped to 1.
pub fn set_min_size_for_parallelism(n: usize) {
    PARALLEL_THRESHOLD.store(n.max(1), Ordering::Relaxed);
}
