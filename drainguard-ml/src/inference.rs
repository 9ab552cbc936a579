//! Model-based and rule-based inference
//!
//! Both paths are pure functions over the same inputs and return an
//! [`Assessment`]. The detector picks one per call; neither touches
//! detector state.
//!
//! ## Rule Path
//!
//! Each matching condition proposes a score, the highest wins:
//!
//! | Condition                     | Score                      | Type       |
//! |-------------------------------|----------------------------|------------|
//! | water < blockage              | 70 + (blockage − w)·3      | BLOCKAGE   |
//! | water > leakage               | 60 + (w − leakage)·0.5     | LEAKAGE    |
//! | gas > danger                  | 80 + (g − danger)·0.02     | GAS_HAZARD |
//! | warning < gas ≤ danger        | 40 + (g − warning)·0.03    | GAS_HAZARD |
//! | water < floor and gas > floor | 85 (replaces the above)    | FLOOD_RISK |
//!
//! Equal scores resolve to the condition listed last. Scores are capped at
//! 100 and rule confidence is fixed at 60.

use drainguard_core::config::SensorSettings;
use drainguard_core::constants::sensors;
use drainguard_core::{InferenceMode, RiskType};

use crate::artifact::ModelArtifact;
use crate::features::FeatureVector;
use crate::scoring::{confidence_from_score, score_to_risk};

/// Confidence attached to every rule-based detection
pub const RULE_CONFIDENCE: f64 = 60.0;

/// Score forced by the flood-risk override
pub const FLOOD_RISK_SCORE: f64 = 85.0;

/// Fixed thresholds used by rules and by model-path classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Blockage below this water distance (cm)
    pub water_blockage_cm: f64,
    /// Leakage above this water distance (cm)
    pub water_leakage_cm: f64,
    /// Flood override needs water below this (cm)
    pub flood_water_floor_cm: f64,
    /// Gas warning threshold
    pub gas_warning: f64,
    /// Gas danger threshold
    pub gas_danger: f64,
    /// Flood override needs gas above this
    pub flood_gas_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            water_blockage_cm: sensors::WATER_BLOCKAGE_THRESHOLD_CM,
            water_leakage_cm: sensors::WATER_LEAKAGE_THRESHOLD_CM,
            flood_water_floor_cm: sensors::FLOOD_WATER_FLOOR_CM,
            gas_warning: f64::from(sensors::GAS_WARNING_THRESHOLD),
            gas_danger: f64::from(sensors::GAS_DANGER_THRESHOLD),
            flood_gas_floor: f64::from(sensors::FLOOD_GAS_FLOOR),
        }
    }
}

impl Thresholds {
    /// Take the thresholds from sensor settings
    pub fn from_settings(sensors: &SensorSettings) -> Self {
        Self {
            water_blockage_cm: sensors.water_blockage_cm,
            water_leakage_cm: sensors.water_leakage_cm,
            flood_water_floor_cm: sensors.flood_water_floor_cm,
            gas_warning: f64::from(sensors.gas_warning),
            gas_danger: f64::from(sensors.gas_danger),
            flood_gas_floor: f64::from(sensors.flood_gas_floor),
        }
    }
}

/// Unrounded verdict of one inference path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// Anomalous or not
    pub is_anomaly: bool,
    /// Risk in `[0, 100]`
    pub risk_score: f64,
    /// Physical condition
    pub risk_type: RiskType,
    /// Confidence in `[0, 100]`
    pub confidence: f64,
    /// Forest decision value, model path only
    pub raw_score: Option<f64>,
    /// Path that produced this verdict
    pub mode: InferenceMode,
}

/// Fixed-threshold inference on the raw values
pub fn rule_predict(water: f64, gas: f64, thresholds: &Thresholds) -> Assessment {
    let mut best: Option<(f64, RiskType)> = None;
    let mut propose = |score: f64, risk_type: RiskType| {
        if best.map_or(true, |(current, _)| score >= current) {
            best = Some((score, risk_type));
        }
    };

    if water < thresholds.water_blockage_cm {
        propose(70.0 + (thresholds.water_blockage_cm - water) * 3.0, RiskType::Blockage);
    }
    if water > thresholds.water_leakage_cm {
        propose(60.0 + (water - thresholds.water_leakage_cm) * 0.5, RiskType::Leakage);
    }
    if gas > thresholds.gas_danger {
        propose(80.0 + (gas - thresholds.gas_danger) * 0.02, RiskType::GasHazard);
    } else if gas > thresholds.gas_warning {
        propose(40.0 + (gas - thresholds.gas_warning) * 0.03, RiskType::GasHazard);
    }

    if water < thresholds.flood_water_floor_cm && gas > thresholds.flood_gas_floor {
        best = Some((FLOOD_RISK_SCORE, RiskType::FloodRisk));
    }

    let (risk_score, risk_type, is_anomaly) = match best {
        Some((score, risk_type)) => (score.clamp(0.0, 100.0), risk_type, true),
        None => (0.0, RiskType::Normal, false),
    };

    Assessment {
        is_anomaly,
        risk_score,
        risk_type,
        confidence: RULE_CONFIDENCE,
        raw_score: None,
        mode: InferenceMode::Rules,
    }
}

/// Scaler + forest inference; the type comes from the raw values
pub fn model_predict(
    features: &FeatureVector,
    artifact: &ModelArtifact,
    thresholds: &Thresholds,
) -> Assessment {
    let scored = artifact.score(features);
    let is_anomaly = scored.is_anomaly();
    let risk_type = if is_anomaly {
        classify_risk_type(features.water_level_cm, features.gas_level, thresholds)
    } else {
        RiskType::Normal
    };

    Assessment {
        is_anomaly,
        risk_score: score_to_risk(scored.decision),
        risk_type,
        confidence: confidence_from_score(scored.decision),
        raw_score: Some(scored.decision),
        mode: InferenceMode::Model,
    }
}

/// Condition behind a reading the model already labelled anomalous.
///
/// Falls back to `Blockage` when no threshold is crossed, e.g. for
/// readings that are anomalous only by volatility.
pub fn classify_risk_type(water: f64, gas: f64, thresholds: &Thresholds) -> RiskType {
    if water < thresholds.water_blockage_cm {
        if gas > thresholds.gas_warning {
            RiskType::FloodRisk
        } else {
            RiskType::Blockage
        }
    } else if water > thresholds.water_leakage_cm {
        RiskType::Leakage
    } else if gas > thresholds.gas_warning {
        RiskType::GasHazard
    } else {
        RiskType::Blockage
    }
}

/// Operator-facing message for a detection
pub fn details(risk_type: RiskType, water: f64, gas: u16, risk_score: f64) -> String {
    match risk_type {
        RiskType::Normal => format!("System operating normally. Water: {:.1}cm, Gas: {}", water, gas),
        RiskType::Blockage => format!(
            "Potential blockage detected. Water level critically low at {:.1}cm, \
             indicating high water in drain pipe. Immediate inspection recommended.",
            water
        ),
        RiskType::Leakage => format!(
            "Possible leakage detected. Water level at {:.1}cm is abnormally high \
             (low water in drain), suggesting pipe damage or unauthorized discharge.",
            water
        ),
        RiskType::GasHazard => format!(
            "Hazardous gas concentration detected at {} ADC units. Ventilation required \
             before personnel entry. Risk score: {:.0}%.",
            gas, risk_score
        ),
        RiskType::FloodRisk => format!(
            "Flood risk condition. Water level at {:.1}cm with elevated gas at {}. \
             Drain capacity may be exceeded. Alert municipal flood response team.",
            water, gas
        ),
    }
}
