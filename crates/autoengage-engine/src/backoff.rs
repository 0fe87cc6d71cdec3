//! Retry backoff and inter-URL delay policy.

use std::time::Duration;

use rand::Rng;

use autoengage_protocols::RunSettings;

/// Exponential backoff before retry number `attempts`.
///
/// `min(5 * 2^(attempts - 1), 30)` seconds, so the sequence runs
/// 5, 10, 20, 30, 30, ... `attempts` is the error count so far (>= 1).
pub fn retry_backoff(attempts: u32) -> Duration {
    let doublings = attempts.saturating_sub(1).min(3);
    let secs = (5u64 << doublings).min(30);
    Duration::from_secs(secs)
}

/// Uniform random inter-URL delay in whole seconds from
/// `[min_delay_secs, max_delay_secs]`.
pub fn inter_url_delay(settings: &RunSettings) -> u64 {
    let min = settings.min_delay_secs;
    let max = settings.max_delay_secs;
    if min >= max {
        return min;
    }
    let mut rng = rand::rng();
    rng.random_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        assert_eq!(retry_backoff(1), Duration::from_secs(5));
        assert_eq!(retry_backoff(2), Duration::from_secs(10));
        assert_eq!(retry_backoff(3), Duration::from_secs(20));
        assert_eq!(retry_backoff(4), Duration::from_secs(30));
        assert_eq!(retry_backoff(5), Duration::from_secs(30));
        assert_eq!(retry_backoff(20), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_zero_attempts() {
        // Degenerate input clamps to the first step
        assert_eq!(retry_backoff(0), Duration::from_secs(5));
    }

    #[test]
    fn test_inter_url_delay_within_bounds() {
        let settings = RunSettings {
            min_delay_secs: 5,
            max_delay_secs: 15,
            ..Default::default()
        };
        for _ in 0..100 {
            let delay = inter_url_delay(&settings);
            assert!((5..=15).contains(&delay));
        }
    }

    #[test]
    fn test_inter_url_delay_degenerate_range() {
        let settings = RunSettings {
            min_delay_secs: 7,
            max_delay_secs: 7,
            ..Default::default()
        };
        assert_eq!(inter_url_delay(&settings), 7);
    }
}
