//! Sensor Specifications and Thresholds
//!
//! The water sensor is an ultrasonic distance sensor mounted above the
//! drain: it reports the distance to the water surface, so a *smaller*
//! value means *more* water in the pipe. The gas sensor is an MQ-series
//! sensor read through the ESP32's 12-bit ADC.

// ===== WATER LEVEL (DISTANCE) =====

/// Minimum physical distance reading (cm).
pub const WATER_LEVEL_MIN_CM: f64 = 0.0;

/// Maximum physical distance reading (cm).
///
/// Beyond 2 m the ultrasonic echo is unreliable in a drain shaft.
pub const WATER_LEVEL_MAX_CM: f64 = 200.0;

/// Lower edge of the normal operating band (cm).
pub const WATER_NORMAL_LOW_CM: f64 = 20.0;

/// Upper edge of the normal operating band (cm).
pub const WATER_NORMAL_HIGH_CM: f64 = 60.0;

/// Below this distance the pipe is close to full: blockage warning (cm).
pub const WATER_BLOCKAGE_THRESHOLD_CM: f64 = 10.0;

/// Above this distance the drain is abnormally empty: leakage warning (cm).
pub const WATER_LEAKAGE_THRESHOLD_CM: f64 = 100.0;

/// Water floor for the combined flood-risk condition (cm).
pub const FLOOD_WATER_FLOOR_CM: f64 = 5.0;

// ===== GAS CONCENTRATION (ADC) =====

/// Minimum ADC reading.
pub const GAS_LEVEL_MIN: u16 = 0;

/// Maximum ADC reading (12-bit).
pub const GAS_LEVEL_MAX: u16 = 4095;

/// Upper edge of normal sewer-gas background.
pub const GAS_NORMAL_MAX: u16 = 800;

/// Elevated gas: warning.
pub const GAS_WARNING_THRESHOLD: u16 = 1500;

/// Hazardous gas: no personnel entry.
pub const GAS_DANGER_THRESHOLD: u16 = 2500;

/// Gas floor for the combined flood-risk condition.
pub const FLOOD_GAS_FLOOR: u16 = 800;

// ===== SIMULATED NORMAL OPERATION =====

/// Clip range for simulated normal water values (cm).
pub const SIM_WATER_CLIP_CM: (f64, f64) = (8.0, 85.0);

/// Lower clip for simulated normal gas values.
pub const SIM_GAS_FLOOR: f64 = 100.0;

/// Baseline of simulated gas values.
pub const SIM_GAS_BASE: f64 = 400.0;

/// Amplitude of the simulated gas oscillation.
pub const SIM_GAS_AMPLITUDE: f64 = 80.0;

/// Standard deviation of simulated water jitter (cm).
pub const SIM_WATER_NOISE_CM: f64 = 2.0;

/// Standard deviation of simulated gas jitter.
pub const SIM_GAS_NOISE: f64 = 40.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_partition_ranges() {
        assert!(WATER_LEVEL_MIN_CM < FLOOD_WATER_FLOOR_CM);
        assert!(FLOOD_WATER_FLOOR_CM < WATER_BLOCKAGE_THRESHOLD_CM);
        assert!(WATER_BLOCKAGE_THRESHOLD_CM < WATER_NORMAL_LOW_CM);
        assert!(WATER_NORMAL_HIGH_CM < WATER_LEAKAGE_THRESHOLD_CM);
        assert!(WATER_LEAKAGE_THRESHOLD_CM < WATER_LEVEL_MAX_CM);

        assert!(GAS_NORMAL_MAX < GAS_WARNING_THRESHOLD);
        assert!(GAS_WARNING_THRESHOLD < GAS_DANGER_THRESHOLD);
        assert!(GAS_DANGER_THRESHOLD < GAS_LEVEL_MAX);
    }
}
