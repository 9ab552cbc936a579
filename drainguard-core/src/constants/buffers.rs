//! Buffer Sizes and Limits

/// Capacity of the reading queue between a source and the pipeline.
///
/// At the default 1 Hz sample rate this holds over 16 minutes of readings,
/// far more than the consumer ever lags in practice.
pub const READING_QUEUE_CAPACITY: usize = 1000;

/// Default rolling window for feature extraction (samples).
pub const DEFAULT_ROLLING_WINDOW: usize = 10;

/// History keeps this many windows of readings.
pub const HISTORY_WINDOWS: usize = 2;

/// Minimum history length before the model path is used.
pub const MIN_MODEL_HISTORY: usize = 3;

/// Live readings log is archived once it holds this many rows.
pub const MAX_LIVE_ROWS: usize = 10_000;

/// Longest accepted line on a hardware link (bytes).
pub const MAX_LINK_LINE_LEN: usize = 512;
