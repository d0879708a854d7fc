//! Poll interval jitter
//!
//! Pure function that can be tested without the scheduler.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Pick a uniformly-distributed whole number of seconds in [min, max],
/// inclusive, fresh on every call.
///
/// Randomized spacing between passes avoids synchronized polling storms
/// when multiple instances run against the same provider.
pub fn jitter_secs(min: u64, max: u64) -> u64 {
    debug_assert!(min <= max);
    let hasher = RandomState::new().build_hasher();
    min + hasher.finish() % (max - min + 1)
}
