//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

use crate::resilience::policy::RetryPolicy;

/// Delay before the attempt following failed `attempt` (1-based), without jitter.
///
/// `min(initial_delay * backoff_multiplier^(attempt - 1), max_delay)`, computed in
/// floating point and clamped before converting back so large attempt counts
/// cannot overflow.
pub fn base_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let initial_ns = policy.initial_delay().as_nanos() as f64;
    let max_ns = policy.max_delay().as_nanos() as f64;
    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let delay_ns = initial_ns * policy.backoff_multiplier().powi(exponent);

    if !delay_ns.is_finite() || delay_ns >= max_ns {
        return policy.max_delay();
    }
    Duration::from_nanos(delay_ns.round() as u64)
}

/// Calculate the backoff delay including jitter, never exceeding `max_delay`.
pub fn calculate_backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    let delay = base_delay(policy, attempt);
    let ratio = policy.jitter_ratio();
    if ratio <= 0.0 {
        return delay;
    }

    // Jitter of 0..ratio of the delay
    let jitter_range = (delay.as_millis() as f64 * ratio) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    (delay + Duration::from_millis(jitter)).min(policy.max_delay())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(initial: u64, mult: f64, max: u64) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(10)
            .initial_delay(Duration::from_millis(initial))
            .backoff_multiplier(mult)
            .max_delay(Duration::from_millis(max))
            .build()
            .unwrap()
    }

    #[test]
    fn test_backoff_calculation() {
        let p = policy(1000, 2.0, 30_000);
        let delays: Vec<u128> = (1..=7).map(|a| base_delay(&p, a).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn test_multiplier_one_is_constant() {
        let p = policy(250, 1.0, 1000);
        assert_eq!(base_delay(&p, 1), Duration::from_millis(250));
        assert_eq!(base_delay(&p, 9), Duration::from_millis(250));
    }

    #[test]
    fn test_huge_attempt_clamps() {
        let p = policy(1000, 10.0, 5000);
        assert_eq!(base_delay(&p, u32::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let p = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(1000))
            .jitter_ratio(0.5)
            .build()
            .unwrap();

        for _ in 0..50 {
            let d = calculate_backoff(&p, 1);
            assert!(d >= Duration::from_millis(100));
            assert!(d < Duration::from_millis(150));
        }
    }

    proptest! {
        #[test]
        fn delay_never_exceeds_max_and_never_decreases(
            initial in 0u64..10_000,
            extra in 0u64..100_000,
            mult in 1.0f64..8.0,
            attempt in 1u32..200,
        ) {
            let p = policy(initial, mult, initial + extra);
            let current = base_delay(&p, attempt);
            let next = base_delay(&p, attempt + 1);
            prop_assert!(current <= p.max_delay());
            prop_assert!(next >= current);
        }
    }
}
