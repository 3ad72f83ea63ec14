//! Adaptive pacing between LLM calls.
//!
//! The controller only looks at the call that just happened: whether it was
//! rejected for rate limiting, how long it took, and which attempt it was.
//! It keeps no history of its own.

use tracing::warn;

use crate::config::RateLimitConfig;

/// Latency below which the endpoint counts as fast, in seconds.
const FAST_LATENCY_SECS: f64 = 1.0;

/// Latency above which the endpoint counts as slow, in seconds.
const SLOW_LATENCY_SECS: f64 = 5.0;

/// Delay policy built from validated `rate_limit` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateController {
    fast: u64,
    normal: u64,
    slow: u64,
    backoff_initial: u64,
    backoff_max: u64,
}

impl Default for RateController {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

impl RateController {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let secs = |v: i64| u64::try_from(v).unwrap_or(0);
        Self {
            fast: secs(config.delays.fast),
            normal: secs(config.delays.normal),
            slow: secs(config.delays.slow),
            backoff_initial: secs(config.backoff.initial),
            backoff_max: secs(config.backoff.max),
        }
    }

    /// Seconds to wait before the next call.
    ///
    /// Rate-limited calls back off linearly with the attempt number up to
    /// the cap. Otherwise fast responses shorten the wait and slow ones
    /// lengthen it; unknown latency gets the steady-state delay.
    pub fn next_delay(&self, last_latency: Option<f64>, was_rate_limited: bool, attempt: u32) -> u64 {
        if was_rate_limited {
            let backoff = self
                .backoff_initial
                .saturating_mul(u64::from(attempt))
                .min(self.backoff_max);
            warn!("Rate limited, backing off for {}s", backoff);
            return backoff;
        }

        match last_latency {
            Some(latency) if latency < FAST_LATENCY_SECS => self.fast,
            Some(latency) if latency > SLOW_LATENCY_SECS => self.slow,
            _ => self.normal,
        }
    }

    /// Delay applied after a successful call on its first attempt.
    pub fn steady_state_delay(&self) -> u64 {
        self.next_delay(None, false, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_ramps_linearly() {
        let rc = RateController::default();
        assert_eq!(rc.next_delay(None, true, 1), 10);
        assert_eq!(rc.next_delay(None, true, 2), 20);
        assert_eq!(rc.next_delay(Some(0.1), true, 3), 30);
    }

    #[test]
    fn test_rate_limited_is_capped() {
        let rc = RateController::default();
        assert_eq!(rc.next_delay(None, true, 5), 30);
        assert_eq!(rc.next_delay(None, true, u32::MAX), 30);
    }

    #[test]
    fn test_latency_branches() {
        let rc = RateController::default();
        assert_eq!(rc.next_delay(Some(0.5), false, 1), 5);
        assert_eq!(rc.next_delay(Some(6.0), false, 1), 15);
        assert_eq!(rc.next_delay(Some(1.0), false, 1), 10);
        assert_eq!(rc.next_delay(Some(5.0), false, 1), 10);
        assert_eq!(rc.next_delay(None, false, 1), 10);
    }

    #[test]
    fn test_steady_state_is_normal_delay() {
        assert_eq!(RateController::default().steady_state_delay(), 10);
    }

    #[test]
    fn test_from_config_uses_custom_values() {
        let mut config = RateLimitConfig::default();
        config.delays.normal = 2;
        config.backoff.initial = 1;
        config.backoff.max = 4;
        let rc = RateController::from_config(&config);
        assert_eq!(rc.steady_state_delay(), 2);
        assert_eq!(rc.next_delay(None, true, 3), 3);
        assert_eq!(rc.next_delay(None, true, 9), 4);
    }
}
