//! Log records produced by the pipeline
//!
//! An `EnrichedReading` merges a reading with its detection and becomes one
//! row of the readings log. An `Alert` is the subset of enriched readings
//! that are anomalous and not suppressed, plus the rendered message.

use serde::Serialize;

use crate::reading::{format_decimal, Reading};
use crate::risk::{Detection, RiskLevel, RiskType};

/// A reading paired with its detection, ready to be logged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReading {
    /// Source reading
    pub reading: Reading,
    /// Whether the detector flagged the reading
    pub is_anomaly: bool,
    /// Detected condition
    pub anomaly_type: RiskType,
    /// Risk score in `[0, 100]`
    pub risk_score: f64,
    /// Risk band
    pub risk_level: RiskLevel,
}

impl EnrichedReading {
    /// Merge a reading with the detection computed for it
    pub fn new(reading: Reading, detection: &Detection) -> Self {
        Self {
            reading,
            is_anomaly: detection.is_anomaly,
            anomaly_type: detection.risk_type,
            risk_score: detection.risk_score,
            risk_level: detection.risk_level,
        }
    }
}

/// A raised alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Logged reading that raised the alert
    pub record: EnrichedReading,
    /// Human-readable description of the condition
    pub message: String,
}

impl Alert {
    /// Build an alert when the detection calls for one.
    ///
    /// Returns `None` for normal or cooldown-suppressed detections.
    pub fn from_detection(record: &EnrichedReading, detection: &Detection) -> Option<Self> {
        if !detection.raises_alert() {
            return None;
        }
        Some(Self {
            record: record.clone(),
            message: detection.details.clone(),
        })
    }

    /// One-line summary for operators
    pub fn summary(&self) -> String {
        format!(
            "[ALERT] {} | Risk: {}% | Water: {}cm | Gas: {}",
            self.record.anomaly_type,
            format_decimal(self.record.risk_score),
            format_decimal(self.record.reading.water_level_cm),
            self.record.reading.gas_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::InferenceMode;

    fn detection(is_anomaly: bool, suppressed: bool) -> Detection {
        Detection {
            is_anomaly,
            risk_score: 85.0,
            risk_level: RiskLevel::High,
            risk_type: RiskType::Blockage,
            confidence: 60.0,
            raw_score: None,
            details: "Potential blockage detected.".into(),
            alert_suppressed: suppressed,
            mode: InferenceMode::Rules,
        }
    }

    #[test]
    fn alert_only_for_unsuppressed_anomalies() {
        let reading = Reading::now(5.0, 200);

        let raised = detection(true, false);
        let record = EnrichedReading::new(reading, &raised);
        let alert = Alert::from_detection(&record, &raised).unwrap();
        assert_eq!(alert.message, "Potential blockage detected.");
        assert_eq!(alert.summary(), "[ALERT] BLOCKAGE | Risk: 85.0% | Water: 5.0cm | Gas: 200");

        let suppressed = detection(true, true);
        assert!(Alert::from_detection(&record, &suppressed).is_none());

        let normal = detection(false, false);
        assert!(Alert::from_detection(&record, &normal).is_none());
    }
}
