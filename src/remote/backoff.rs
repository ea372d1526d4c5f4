//! Capped exponential backoff for reconnect attempts.

use std::time::Duration;

/// Delay before retry number `attempt` (zero-based): `base * 2^attempt`,
/// never more than `max`.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max)
}
