//! Heartbeat timing contract
//!
//! The connection initiator sends a `Heartbeat` every `interval`, whether or
//! not other traffic is flowing. The acceptor answers each one with a
//! `HeartbeatAck` that echoes the sequence and timestamp untouched.
//!
//! Both ends bound every receive by `interval * TIMEOUT_MULTIPLIER`. A peer
//! that stays silent longer than that is treated as dead and the connection
//! is torn down.

use std::time::{Duration, SystemTime};

use crate::message::{Heartbeat, HeartbeatAck, Timestamp};

/// Default interval between heartbeats
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Receive timeout as a multiple of the heartbeat interval
pub const TIMEOUT_MULTIPLIER: u32 = 2;

/// Timing shared by both ends of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessContract {
    interval: Duration,
}

impl LivenessContract {
    /// Create a contract with the given heartbeat interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Interval between heartbeats
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on any single blocking receive
    pub fn read_timeout(&self) -> Duration {
        self.interval * TIMEOUT_MULTIPLIER
    }
}

impl Default for LivenessContract {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}

impl Heartbeat {
    /// Create a heartbeat stamped with `sent_at`
    pub fn new(sequence: u64, sent_at: SystemTime) -> Self {
        Self {
            sequence,
            sent_at: Timestamp::from_system_time(sent_at),
        }
    }

    /// The acknowledgment for this heartbeat
    pub fn ack(&self) -> HeartbeatAck {
        HeartbeatAck {
            sequence: self.sequence,
            sent_at: self.sent_at,
        }
    }
}

impl HeartbeatAck {
    /// Round trip time measured at `now`.
    ///
    /// Zero if the echoed timestamp is in the future or out of range.
    pub fn latency_at(&self, now: SystemTime) -> Duration {
        self.sent_at
            .to_system_time()
            .and_then(|sent| now.duration_since(sent).ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Round trip time measured now
    pub fn latency(&self) -> Duration {
        self.latency_at(SystemTime::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_read_timeout_is_twice_interval() {
        let contract = LivenessContract::new(Duration::from_secs(60));
        assert_eq!(contract.read_timeout(), Duration::from_secs(120));

        let contract = LivenessContract::new(Duration::from_millis(250));
        assert_eq!(contract.read_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(LivenessContract::default().interval(), DEFAULT_HEARTBEAT_INTERVAL);
    }

    #[test]
    fn test_ack_echoes_unchanged() {
        let sent = UNIX_EPOCH + Duration::new(1_700_000_000, 5);
        let hb = Heartbeat::new(7, sent);
        let ack = hb.ack();
        assert_eq!(ack.sequence, 7);
        assert_eq!(ack.sent_at, hb.sent_at);
        assert_eq!(ack.sent_at.to_system_time(), Some(sent));
    }

    #[test]
    fn test_latency() {
        let sent = UNIX_EPOCH + Duration::from_secs(1_000);
        let ack = Heartbeat::new(1, sent).ack();
        assert_eq!(
            ack.latency_at(sent + Duration::from_millis(35)),
            Duration::from_millis(35)
        );
    }

    #[test]
    fn test_latency_clock_skew_is_zero() {
        let sent = UNIX_EPOCH + Duration::from_secs(1_000);
        let ack = Heartbeat::new(1, sent).ack();
        assert_eq!(ack.latency_at(sent - Duration::from_secs(1)), Duration::ZERO);
    }

    #[test]
    fn test_latency_of_unrepresentable_timestamp_is_zero() {
        let now = SystemTime::now();
        for (seconds, nanos) in [
            (i64::MAX, 2_000_000_000),
            (i64::MAX, i64::MAX),
            (i64::MIN, i64::MIN),
        ] {
            let ack = HeartbeatAck {
                sequence: 0,
                sent_at: Timestamp::new(seconds, nanos),
            };
            assert_eq!(ack.latency_at(now), Duration::ZERO);
        }
    }
}
