//! Time utilities for tickwatch

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, negative for earlier times.
pub fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(before) => {
            let before = before.duration();
            // Round towards negative infinity, like a floor division would
            let secs = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_epoch_seconds_truncates_subsecond() {
        let time = UNIX_EPOCH + Duration::new(1_234, 999_999_999);
        assert_eq!(epoch_seconds(time), 1_234);
    }

    #[test]
    fn test_epoch_seconds_before_epoch() {
        assert_eq!(epoch_seconds(UNIX_EPOCH - Duration::from_secs(3)), -3);
        assert_eq!(epoch_seconds(UNIX_EPOCH - Duration::from_millis(1_500)), -2);
    }
}
