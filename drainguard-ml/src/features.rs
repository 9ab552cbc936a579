//! Rolling-window feature extraction
//!
//! Each reading is turned into nine features computed from the reading
//! itself and the detector's history (which already contains it):
//!
//! ```text
//! water_level_cm, gas_level          raw values
//! water_rolling_mean/std             over the last min(len, window) samples
//! gas_rolling_mean/std               idem; std is 0 below two samples
//! water_delta, gas_delta             current minus previous, 0 for the first
//! water_gas_ratio                    water / max(gas, 1)
//! ```
//!
//! Standard deviation is the sample estimator (n - 1 denominator), matching
//! what the training side uses.

use core::fmt;
use core::str::FromStr;

use drainguard_core::buffer::CircularBuffer;

/// One point in the detector's history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Water distance (cm)
    pub water: f64,
    /// Gas level (ADC units)
    pub gas: f64,
}

impl Sample {
    /// Create a sample
    pub fn new(water: f64, gas: f64) -> Self {
        Self { water, gas }
    }
}

/// Names of the features a model artifact may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Raw water distance
    WaterLevel,
    /// Raw gas level
    GasLevel,
    /// Rolling mean of water
    WaterRollingMean,
    /// Rolling std of water
    WaterRollingStd,
    /// Rolling mean of gas
    GasRollingMean,
    /// Rolling std of gas
    GasRollingStd,
    /// Water change since previous sample
    WaterDelta,
    /// Gas change since previous sample
    GasDelta,
    /// Water over gas
    WaterGasRatio,
}

impl Feature {
    /// Every feature, in canonical order
    pub const ALL: [Feature; 9] = [
        Feature::WaterLevel,
        Feature::GasLevel,
        Feature::WaterRollingMean,
        Feature::WaterRollingStd,
        Feature::GasRollingMean,
        Feature::GasRollingStd,
        Feature::WaterDelta,
        Feature::GasDelta,
        Feature::WaterGasRatio,
    ];

    /// Column name used by the training side
    pub const fn name(self) -> &'static str {
        match self {
            Feature::WaterLevel => "water_level_cm",
            Feature::GasLevel => "gas_level",
            Feature::WaterRollingMean => "water_rolling_mean",
            Feature::WaterRollingStd => "water_rolling_std",
            Feature::GasRollingMean => "gas_rolling_mean",
            Feature::GasRollingStd => "gas_rolling_std",
            Feature::WaterDelta => "water_delta",
            Feature::GasDelta => "gas_delta",
            Feature::WaterGasRatio => "water_gas_ratio",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Features of one reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    /// Raw water distance (cm)
    pub water_level_cm: f64,
    /// Raw gas level
    pub gas_level: f64,
    /// Rolling mean of water
    pub water_rolling_mean: f64,
    /// Rolling std of water
    pub water_rolling_std: f64,
    /// Rolling mean of gas
    pub gas_rolling_mean: f64,
    /// Rolling std of gas
    pub gas_rolling_std: f64,
    /// Water change since previous sample
    pub water_delta: f64,
    /// Gas change since previous sample
    pub gas_delta: f64,
    /// Water over gas, gas floored at 1
    pub water_gas_ratio: f64,
}

impl FeatureVector {
    /// Compute features for the newest sample in `history`.
    ///
    /// Returns `None` when the history is empty.
    pub fn from_history(history: &CircularBuffer<Sample>, window: usize) -> Option<Self> {
        let current = *history.last()?;
        let window = window.max(1).min(history.len());

        let water: Vec<f64> = history.tail(window).map(|s| s.water).collect();
        let gas: Vec<f64> = history.tail(window).map(|s| s.gas).collect();
        let (water_mean, water_std) = mean_std(&water);
        let (gas_mean, gas_std) = mean_std(&gas);

        let (water_delta, gas_delta) = match history.len().checked_sub(2).and_then(|i| history.get(i)) {
            Some(previous) => (current.water - previous.water, current.gas - previous.gas),
            None => (0.0, 0.0),
        };

        Some(Self {
            water_level_cm: current.water,
            gas_level: current.gas,
            water_rolling_mean: water_mean,
            water_rolling_std: water_std,
            gas_rolling_mean: gas_mean,
            gas_rolling_std: gas_std,
            water_delta,
            gas_delta,
            water_gas_ratio: current.water / current.gas.max(1.0),
        })
    }

    /// Value of one feature
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::WaterLevel => self.water_level_cm,
            Feature::GasLevel => self.gas_level,
            Feature::WaterRollingMean => self.water_rolling_mean,
            Feature::WaterRollingStd => self.water_rolling_std,
            Feature::GasRollingMean => self.gas_rolling_mean,
            Feature::GasRollingStd => self.gas_rolling_std,
            Feature::WaterDelta => self.water_delta,
            Feature::GasDelta => self.gas_delta,
            Feature::WaterGasRatio => self.water_gas_ratio,
        }
    }

    /// Values in the given feature order
    pub fn ordered(&self, order: &[Feature]) -> Vec<f64> {
        order.iter().map(|feature| self.get(*feature)).collect()
    }
}

/// Mean and sample standard deviation; std is 0 below two values
fn mean_std(values: &[f64]) -> (f64, f64) {
    let count = values.len();
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / count as f64;
    if count < 2 {
        return (mean, 0.0);
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (squares / (count - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(points: &[(f64, f64)], capacity: usize) -> CircularBuffer<Sample> {
        let mut buffer = CircularBuffer::with_capacity(capacity);
        for &(water, gas) in points {
            buffer.push(Sample::new(water, gas));
        }
        buffer
    }

    #[test]
    fn first_sample_has_no_spread_or_delta() {
        let features = FeatureVector::from_history(&history(&[(40.0, 400.0)], 20), 10).unwrap();
        assert_eq!(features.water_rolling_mean, 40.0);
        assert_eq!(features.water_rolling_std, 0.0);
        assert_eq!(features.gas_rolling_std, 0.0);
        assert_eq!(features.water_delta, 0.0);
        assert_eq!(features.gas_delta, 0.0);
        assert_eq!(features.water_gas_ratio, 0.1);
    }

    #[test]
    fn window_shrinks_to_history() {
        let features =
            FeatureVector::from_history(&history(&[(10.0, 100.0), (20.0, 300.0)], 20), 10).unwrap();
        assert_eq!(features.water_rolling_mean, 15.0);
        assert!((features.water_rolling_std - 7.0710678).abs() < 1e-6);
        assert_eq!(features.gas_rolling_mean, 200.0);
        assert_eq!(features.water_delta, 10.0);
        assert_eq!(features.gas_delta, 200.0);
    }

    #[test]
    fn window_limits_statistics() {
        let points: Vec<(f64, f64)> = (0..8).map(|i| (i as f64, 500.0)).collect();
        let features = FeatureVector::from_history(&history(&points, 20), 3).unwrap();
        // last three: 5, 6, 7
        assert_eq!(features.water_rolling_mean, 6.0);
        assert_eq!(features.water_rolling_std, 1.0);
        assert_eq!(features.gas_rolling_std, 0.0);
    }

    #[test]
    fn ratio_floors_gas() {
        let features = FeatureVector::from_history(&history(&[(12.0, 0.0)], 4), 10).unwrap();
        assert_eq!(features.water_gas_ratio, 12.0);
    }

    #[test]
    fn empty_history_has_no_features() {
        assert!(FeatureVector::from_history(&history(&[], 4), 10).is_none());
    }

    #[test]
    fn names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>(), Ok(feature));
        }
        assert_eq!("humidity".parse::<Feature>(), Err("humidity".to_string()));
    }
}
