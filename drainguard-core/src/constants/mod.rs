//! Constants for DrainGuard Core
//!
//! Centralized defaults for the drain installation: sensor ranges, alert
//! thresholds, buffer sizes and loop timings. `Settings` starts from these
//! values, so a deployment only overrides what differs on its hardware.
//!
//! ## Organization
//!
//! - **Sensors**: physical ranges and hazard thresholds for both sensors
//! - **Buffers**: queue, history and log rotation limits
//! - **Time**: intervals, timeouts and backoff delays
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include the unit in the name (`_CM`, `_MS`, `_SECS`)
//! 3. Keep thresholds next to the range they partition

/// Sensor ranges and hazard thresholds.
pub mod sensors;

/// Queue, history and log sizes.
pub mod buffers;

/// Intervals, timeouts and backoff delays.
pub mod time;

pub use sensors::{
    WATER_LEVEL_MIN_CM, WATER_LEVEL_MAX_CM,
    WATER_BLOCKAGE_THRESHOLD_CM, WATER_LEAKAGE_THRESHOLD_CM,
    GAS_LEVEL_MIN, GAS_LEVEL_MAX,
    GAS_WARNING_THRESHOLD, GAS_DANGER_THRESHOLD,
};

pub use buffers::{
    READING_QUEUE_CAPACITY, DEFAULT_ROLLING_WINDOW, MAX_LIVE_ROWS,
};

pub use time::{
    MS_PER_SECOND, DEFAULT_COOLDOWN_SECS, DEFAULT_JOIN_TIMEOUT_MS,
};
