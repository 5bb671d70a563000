//! Serde helpers for configuration files

/// `Duration` as a number of seconds.
///
/// Whole durations are written as integers (`interval = 60`); fractional
/// ones as floats (`interval = 0.25`). Both forms are accepted on input.
/// Negative or non-finite values are rejected.
pub mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Whole(u64),
        Fractional(f64),
    }

    /// Serialize a Duration as seconds
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_u64(duration.as_secs())
        } else {
            serializer.serialize_f64(duration.as_secs_f64())
        }
    }

    /// Deserialize a Duration from whole or fractional seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Seconds::deserialize(deserializer)? {
            Seconds::Whole(secs) => Ok(Duration::from_secs(secs)),
            Seconds::Fractional(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| D::Error::custom(format!("invalid duration: {} seconds", secs))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        #[serde(with = "duration_secs")]
        interval: Duration,
    }

    #[test]
    fn test_whole_seconds_serialize_as_integer() {
        let config = TestConfig {
            interval: Duration::from_secs(60),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"interval":60}"#);
    }

    #[test]
    fn test_fractional_seconds_roundtrip() {
        let config = TestConfig {
            interval: Duration::from_millis(250),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"interval":0.25}"#);
        let parsed: TestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_accepts_both_forms() {
        let whole: TestConfig = toml::from_str("interval = 5").unwrap();
        assert_eq!(whole.interval, Duration::from_secs(5));

        let fractional: TestConfig = toml::from_str("interval = 1.5").unwrap();
        assert_eq!(fractional.interval, Duration::from_millis(1_500));
    }

    #[test]
    fn test_negative_rejected() {
        let result: Result<TestConfig, _> = serde_json::from_str(r#"{"interval":-1.0}"#);
        assert!(result.is_err());
    }
}
