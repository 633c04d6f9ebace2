//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Jitter added on top of the capped delay, as a fraction of it.
const JITTER_FRACTION: f64 = 0.1;

/// Delay before retry `retry` (1-based; 0 means the first attempt).
///
/// `base * 2^(retry-1)`, capped at `max`, plus up to 10% jitter.
pub fn calculate_backoff(retry: u32, base: Duration, max: Duration) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
    let capped = base.checked_mul(factor).unwrap_or(max).min(max);

    let jitter_ceiling = capped.mul_f64(JITTER_FRACTION);
    if jitter_ceiling.is_zero() {
        return capped;
    }
    capped + jitter_ceiling.mul_f64(rand::thread_rng().gen::<f64>())
}
