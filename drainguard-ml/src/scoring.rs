//! Decision value to risk percentage
//!
//! The forest's decision value is centred on zero: non-negative means
//! normal, negative means anomalous. It is mapped onto the 0-100 risk
//! scale with two linear pieces that meet at 30:
//!
//! ```text
//! risk
//! 100 ┤            ___________
//!     │           /
//!  30 ┤──────────●
//!     │           \___        (s ≥ 0: 30 − 100·s, floored at 0)
//!   0 ┤               \____
//!     └──────────┬──────────── s
//!        −0.35   0    0.3
//! ```
//!
//! Negative scores climb twice as fast (`30 + 200·|s|`, capped at 100) so
//! that a clearly anomalous decision lands in the HIGH or CRITICAL bands.

/// Risk at the boundary between the two pieces
pub const PIVOT_RISK: f64 = 30.0;

/// Risk per unit of non-negative score
const NORMAL_SLOPE: f64 = 100.0;

/// Risk per unit of negative score
const ANOMALY_SLOPE: f64 = 200.0;

/// Confidence ceiling for model-based detections
pub const MAX_MODEL_CONFIDENCE: f64 = 99.0;

/// Map a decision value to a risk percentage in `[0, 100]`
pub fn score_to_risk(score: f64) -> f64 {
    if score >= 0.0 {
        (PIVOT_RISK - score * NORMAL_SLOPE).max(0.0)
    } else {
        (PIVOT_RISK + score.abs() * ANOMALY_SLOPE).min(100.0)
    }
}

/// Confidence of a model-based detection: `min(100·|s|, 99)`
pub fn confidence_from_score(score: f64) -> f64 {
    (score.abs() * 100.0).min(MAX_MODEL_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pieces_meet_at_pivot() {
        assert_eq!(score_to_risk(0.0), 30.0);
        assert!((score_to_risk(-1e-9) - 30.0).abs() < 1e-6);
        assert!((score_to_risk(1e-9) - 30.0).abs() < 1e-6);
    }

    #[test]
    fn clamps() {
        assert_eq!(score_to_risk(0.5), 0.0);
        assert_eq!(score_to_risk(-0.5), 100.0);
        assert!((score_to_risk(-0.2) - 70.0).abs() < 1e-9);
        assert!((confidence_from_score(-0.2) - 20.0).abs() < 1e-9);
        assert_eq!(confidence_from_score(3.0), 99.0);
    }

    proptest! {
        #[test]
        fn risk_stays_in_range(score in -10.0f64..10.0) {
            let risk = score_to_risk(score);
            prop_assert!((0.0..=100.0).contains(&risk));
            let confidence = confidence_from_score(score);
            prop_assert!((0.0..=99.0).contains(&confidence));
        }

        #[test]
        fn more_negative_is_riskier(a in -2.0f64..2.0, b in -2.0f64..2.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(score_to_risk(low) >= score_to_risk(high));
        }

        #[test]
        fn continuous_at_zero(eps in 1e-12f64..1e-6) {
            prop_assert!((score_to_risk(eps) - PIVOT_RISK).abs() < 1e-3);
            prop_assert!((score_to_risk(-eps) - PIVOT_RISK).abs() < 1e-3);
        }
    }
}
