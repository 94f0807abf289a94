//! Delay before restarting a dropped subscription.

use std::time::Duration;

use rand::Rng;

use crate::config::SubscriberConfig;

/// Delay before resubscription attempt `attempt` (1-based).
///
/// Starts at `resubscribe_base_delay_ms`, doubles per failed attempt up to
/// `resubscribe_max_delay_ms`, then adds up to 10% jitter. Attempt 0 means
/// the last pass delivered a block and there is no wait.
pub fn resubscribe_delay(attempt: u32, config: &SubscriberConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let doubled = 1u64
        .checked_shl(attempt - 1)
        .map_or(u64::MAX, |factor| config.resubscribe_base_delay_ms.saturating_mul(factor));
    let capped = doubled.min(config.resubscribe_max_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 10);

    Duration::from_millis(capped + jitter)
}
