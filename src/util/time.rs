//! Timing helpers for reports
//!
//! Human-readable durations and rates, plus a serde adapter that writes a
//! `Duration` as fractional seconds.

use std::time::Duration;

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use imgbench::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Images per second over `duration`, 0 for a zero duration
pub fn calculate_rate(images: usize, duration: Duration) -> f64 {
    let seconds = duration.as_secs_f64();
    if seconds > 0.0 {
        images as f64 / seconds
    } else {
        0.0
    }
}

/// Format a rate with a K/M suffix
///
/// ```
/// use imgbench::util::time::format_rate;
///
/// assert_eq!(format_rate(42.0), "42.0");
/// assert_eq!(format_rate(1500.0), "1.50K");
/// ```
pub fn format_rate(rate: f64) -> String {
    if rate < 1_000.0 {
        format!("{:.1}", rate)
    } else if rate < 1_000_000.0 {
        format!("{:.2}K", rate / 1_000.0)
    } else {
        format!("{:.2}M", rate / 1_000_000.0)
    }
}

/// Serialize a `Duration` as f64 seconds
pub mod serde_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
    }

    #[test]
    fn test_calculate_rate() {
        assert_eq!(calculate_rate(100, Duration::from_secs(4)), 25.0);
        assert_eq!(calculate_rate(100, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(12.34), "12.3");
        assert_eq!(format_rate(2_500_000.0), "2.50M");
    }

    #[derive(Serialize, Deserialize)]
    struct Timed {
        #[serde(with = "serde_secs")]
        elapsed: Duration,
    }

    #[test]
    fn test_serde_secs() {
        let json = serde_json::to_string(&Timed { elapsed: Duration::from_millis(1500) }).unwrap();
        assert_eq!(json, r#"{"elapsed":1.5}"#);

        let back: Timed = serde_json::from_str(r#"{"elapsed":0.25}"#).unwrap();
        assert_eq!(back.elapsed, Duration::from_millis(250));

        assert!(serde_json::from_str::<Timed>(r#"{"elapsed":-1.0}"#).is_err());
    }
}
