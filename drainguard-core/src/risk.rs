//! Risk taxonomy and detection results
//!
//! ## Risk Levels
//!
//! Levels partition the score range `[0, 100]` into contiguous half-open
//! bands:
//!
//! ```text
//! NORMAL    [ 0, 25)
//! LOW       [25, 50)
//! MODERATE  [50, 75)
//! HIGH      [75, 90)
//! CRITICAL  [90, 100]   <- 100 falls through to the top band
//! ```
//!
//! ## Risk Types
//!
//! Exactly one type per detection. Types describe the physical condition,
//! not how it was detected.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordered risk bands over the score range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No meaningful risk
    Normal,
    /// Worth watching
    Low,
    /// Investigate soon
    Moderate,
    /// Investigate now
    High,
    /// Immediate response
    Critical,
}

impl RiskLevel {
    /// All levels in ascending order
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Normal,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Half-open score band `[min, max)` of this level
    pub const fn band(self) -> (f64, f64) {
        match self {
            RiskLevel::Normal => (0.0, 25.0),
            RiskLevel::Low => (25.0, 50.0),
            RiskLevel::Moderate => (50.0, 75.0),
            RiskLevel::High => (75.0, 90.0),
            RiskLevel::Critical => (90.0, 100.0),
        }
    }

    /// Map a risk score to its level.
    ///
    /// Scans the bands in order and returns the first containing the score.
    /// Anything that falls through (a score of exactly 100) is `Critical`.
    pub fn from_score(score: f64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|level| {
                let (min, max) = level.band();
                min <= score && score < max
            })
            .unwrap_or(RiskLevel::Critical)
    }

    /// Label as written to the logs
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Normal => "NORMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// Display color used by dashboards
    pub const fn color(self) -> &'static str {
        match self {
            RiskLevel::Normal => "#22c55e",
            RiskLevel::Low => "#eab308",
            RiskLevel::Moderate => "#f97316",
            RiskLevel::High => "#ef4444",
            RiskLevel::Critical => "#dc2626",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical condition behind a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskType {
    /// Nothing abnormal
    Normal,
    /// Pipe filling up: water surface close to the sensor
    Blockage,
    /// Drain abnormally empty
    Leakage,
    /// Hazardous gas concentration
    GasHazard,
    /// High water combined with elevated gas
    FloodRisk,
}

impl RiskType {
    /// The four anomalous types
    pub const ANOMALIES: [RiskType; 4] = [
        RiskType::Blockage,
        RiskType::Leakage,
        RiskType::GasHazard,
        RiskType::FloodRisk,
    ];

    /// Label as written to the logs
    pub const fn as_str(self) -> &'static str {
        match self {
            RiskType::Normal => "NORMAL",
            RiskType::Blockage => "BLOCKAGE",
            RiskType::Leakage => "LEAKAGE",
            RiskType::GasHazard => "GAS_HAZARD",
            RiskType::FloodRisk => "FLOOD_RISK",
        }
    }

    /// Compact code for lock-free storage in an atomic
    pub const fn code(self) -> u8 {
        match self {
            RiskType::Normal => 0,
            RiskType::Blockage => 1,
            RiskType::Leakage => 2,
            RiskType::GasHazard => 3,
            RiskType::FloodRisk => 4,
        }
    }

    /// Inverse of [`RiskType::code`]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RiskType::Normal),
            1 => Some(RiskType::Blockage),
            2 => Some(RiskType::Leakage),
            3 => Some(RiskType::GasHazard),
            4 => Some(RiskType::FloodRisk),
            _ => None,
        }
    }
}

impl fmt::Display for RiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a risk type label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk type: {0}")]
pub struct UnknownRiskType(pub String);

impl FromStr for RiskType {
    type Err = UnknownRiskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NORMAL" => Ok(RiskType::Normal),
            "BLOCKAGE" => Ok(RiskType::Blockage),
            "LEAKAGE" => Ok(RiskType::Leakage),
            "GAS_HAZARD" => Ok(RiskType::GasHazard),
            "FLOOD_RISK" => Ok(RiskType::FloodRisk),
            _ => Err(UnknownRiskType(s.to_string())),
        }
    }
}

/// Which inference path produced a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceMode {
    /// Scaler + isolation forest from a model artifact
    Model,
    /// Fixed-threshold rules
    Rules,
}

/// Scored output of the anomaly detector for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Whether the reading is anomalous
    pub is_anomaly: bool,
    /// Risk in `[0, 100]`
    pub risk_score: f64,
    /// Band containing `risk_score`
    pub risk_level: RiskLevel,
    /// Physical condition
    pub risk_type: RiskType,
    /// Confidence in `[0, 100]`
    pub confidence: f64,
    /// Scorer decision value; `None` for rule-based detections
    pub raw_score: Option<f64>,
    /// Human-readable explanation
    pub details: String,
    /// Anomalous but within the alert cooldown
    pub alert_suppressed: bool,
    /// Inference path used
    pub mode: InferenceMode,
}

impl Detection {
    /// Whether this detection should raise an alert
    pub fn raises_alert(&self) -> bool {
        self.is_anomaly && !self.alert_suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn band_edges() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_score(24.9), RiskLevel::Normal);
        assert_eq!(RiskLevel::from_score(25.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(50.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(75.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(89.9), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(90.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Critical);
    }

    #[test]
    fn bands_are_contiguous() {
        assert_eq!(RiskLevel::ALL[0].band().0, 0.0);
        for pair in RiskLevel::ALL.windows(2) {
            assert_eq!(pair[0].band().1, pair[1].band().0);
        }
        assert_eq!(RiskLevel::Critical.band().1, 100.0);
    }

    #[test]
    fn risk_type_codes_round_trip() {
        for ty in [RiskType::Normal].iter().chain(RiskType::ANOMALIES.iter()) {
            assert_eq!(RiskType::from_code(ty.code()), Some(*ty));
        }
        assert_eq!(RiskType::from_code(9), None);
    }

    #[test]
    fn parse_risk_type() {
        assert_eq!("gas_hazard".parse::<RiskType>(), Ok(RiskType::GasHazard));
        assert_eq!("FLOOD-RISK".parse::<RiskType>(), Ok(RiskType::FloodRisk));
        assert!("smoke".parse::<RiskType>().is_err());
    }

    proptest! {
        #[test]
        fn exactly_one_band_contains_score(score in 0.0f64..=100.0) {
            let containing = RiskLevel::ALL
                .iter()
                .filter(|level| {
                    let (min, max) = level.band();
                    min <= score && score < max
                })
                .count();
            if score < 100.0 {
                prop_assert_eq!(containing, 1);
            } else {
                prop_assert_eq!(containing, 0);
            }

            let level = RiskLevel::from_score(score);
            let (min, max) = level.band();
            prop_assert!(min <= score && (score < max || score == 100.0));
        }
    }
}
