//! Realtime channel configuration and reconnect policy.

use std::time::Duration;

/// Default number of reconnection attempts after the first failure.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay before the first reconnection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1_000);

/// Default cap on the reconnection delay.
pub const DEFAULT_RECONNECT_DELAY_MAX: Duration = Duration::from_millis(10_000);

/// Default timeout for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default platform tag sent in the identification message.
pub const DEFAULT_PLATFORM: &str = "mobile-app";

/// Configuration for [`RealtimeChannel`](super::RealtimeChannel).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    /// Reconnection attempts allowed after a failure before giving up.
    pub max_reconnect_attempts: u32,

    /// Base reconnection delay, doubled per consecutive failure.
    pub reconnect_delay: Duration,

    /// Upper bound on the reconnection delay.
    pub reconnect_delay_max: Duration,

    /// Timeout for a single connection attempt.
    pub connect_timeout: Duration,

    /// Platform tag for identification.
    pub platform: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reconnect_delay_max: DEFAULT_RECONNECT_DELAY_MAX,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

impl ChannelConfig {
    /// Delay before the next attempt after `failures` consecutive failures:
    /// `min(base * 2^(failures-1), max)`.
    pub fn backoff(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(20);
        self.reconnect_delay
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.reconnect_delay_max)
    }

    /// Total connection attempts before the channel gives up.
    pub fn attempt_budget(&self) -> u32 {
        self.max_reconnect_attempts.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff() {
        let config = ChannelConfig::default();
        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(1));
        assert_eq!(config.backoff(2), Duration::from_secs(2));
        assert_eq!(config.backoff(3), Duration::from_secs(4));
        assert_eq!(config.backoff(4), Duration::from_secs(8));
        assert_eq!(config.backoff(5), Duration::from_secs(10)); // 16 > 10
        assert_eq!(config.backoff(40), Duration::from_secs(10));
    }

    #[test]
    fn test_attempt_budget() {
        assert_eq!(ChannelConfig::default().attempt_budget(), 6);
    }
}
