//! Time-Related Constants

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Minimum time between two raised alerts (seconds).
pub const DEFAULT_COOLDOWN_SECS: u64 = 60;

/// Simulator tick interval (ms).
pub const SIMULATOR_INTERVAL_MS: u64 = 1000;

/// Consumer sleep when the queue is momentarily empty (ms).
pub const EMPTY_QUEUE_POLL_MS: u64 = 100;

/// Bounded wait for one dequeue (ms).
pub const DEQUEUE_TIMEOUT_MS: u64 = 1000;

/// Backoff after a failed pipeline iteration (ms).
pub const ITERATION_ERROR_BACKOFF_MS: u64 = 500;

/// Interval between status reports (ms).
pub const STATUS_INTERVAL_MS: u64 = 10_000;

/// Upper bound on waiting for a worker thread to finish (ms).
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5000;

/// Serial read timeout (ms).
pub const SERIAL_READ_TIMEOUT_MS: u64 = 2000;

/// Delay between failed connection attempts (ms).
pub const SERIAL_CONNECT_RETRY_MS: u64 = 3000;

/// Backoff after a link error before reconnecting (ms).
pub const SERIAL_ERROR_BACKOFF_MS: u64 = 2000;

/// Wait after connecting for the device boot banner (ms).
pub const SERIAL_SETTLE_MS: u64 = 2000;
