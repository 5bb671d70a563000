//! Reconnection pacing

use std::time::Duration;

/// Fixed delay between connection attempts, with an attempt counter
#[derive(Debug, Clone)]
pub struct RetryDelay {
    delay: Duration,
    attempts: u64,
}

impl RetryDelay {
    /// Create a policy that always waits `delay`
    pub fn new(delay: Duration) -> Self {
        Self { delay, attempts: 0 }
    }

    /// Record a failed attempt and return how long to wait before the next one
    pub fn next_delay(&mut self) -> Duration {
        self.attempts += 1;
        self.delay
    }

    /// Failed attempts since creation or the last reset
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Forget earlier failures after a connection got through
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_is_fixed() {
        let mut retry = RetryDelay::new(Duration::from_secs(5));
        assert_eq!(retry.next_delay(), Duration::from_secs(5));
        assert_eq!(retry.next_delay(), Duration::from_secs(5));
        assert_eq!(retry.next_delay(), Duration::from_secs(5));
        assert_eq!(retry.attempts(), 3);
    }

    #[test]
    fn test_reset() {
        let mut retry = RetryDelay::new(Duration::from_secs(1));
        retry.next_delay();
        retry.next_delay();
        retry.reset();
        assert_eq!(retry.attempts(), 0);
    }
}
