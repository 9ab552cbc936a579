//! Sensor readings
//!
//! A `Reading` is created by a telemetry source once a sample has passed
//! boundary validation. It is immutable and consumed exactly once by the
//! pipeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format used in every log row (local time, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One validated water/gas sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Local time the sample was produced or received
    pub timestamp: DateTime<Local>,
    /// Distance from sensor to water surface (cm)
    pub water_level_cm: f64,
    /// Gas concentration (ADC units)
    pub gas_level: u16,
}

impl Reading {
    /// Build a reading stamped with the current local time.
    ///
    /// Callers are expected to have validated the values; see
    /// [`ReadingValidator`](crate::ReadingValidator).
    pub fn now(water_level_cm: f64, gas_level: u16) -> Self {
        Self::at(Local::now(), water_level_cm, gas_level)
    }

    /// Build a reading with an explicit timestamp
    pub fn at(timestamp: DateTime<Local>, water_level_cm: f64, gas_level: u16) -> Self {
        Self {
            timestamp,
            water_level_cm,
            gas_level,
        }
    }

    /// Timestamp rendered the way the log files store it
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Round to a fixed number of decimals, as stored in the logs
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Render a float the way the log consumers expect: integral values keep
/// one decimal (`85.0`), everything else uses the shortest representation.
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_has_microseconds() {
        let ts = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).single().unwrap();
        let reading = Reading::at(ts, 42.0, 400);
        assert_eq!(reading.timestamp_string(), "2024-03-01T12:30:05.000000");
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(84.96, 1), 85.0);
        assert_eq!(round_to(-0.123456, 4), -0.1235);
    }

    #[test]
    fn decimal_rendering() {
        assert_eq!(format_decimal(85.0), "85.0");
        assert_eq!(format_decimal(12.35), "12.35");
        assert_eq!(format_decimal(0.0), "0.0");
    }
}
