//! Strongly typed configuration for the coordination broker.

/// Every tunable the broker reads from its environment at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Connection string for the backing store (e.g. `redis://localhost:6379`).
    pub store_url: String,
    /// Tracing filter directive, e.g. `info` or `broker_kernel=debug`.
    pub log_level: String,
    /// Seconds of heartbeat silence before the liveness monitor declares an agent dead.
    pub heartbeat_timeout_secs: u64,
    /// Interval in seconds between liveness monitor sweeps.
    pub monitor_interval_secs: u64,
    /// Directory into which best-effort completion marker files are written.
    pub status_dir: String,
    /// Maximum messages retained per agent queue before the oldest are evicted.
    pub max_queue_len: usize,
    /// Maximum entries retained in the project recent-changes log.
    pub recent_changes_cap: usize,
    /// Seconds the broker tolerates a store outage before exiting non-zero.
    pub store_reconnect_deadline_secs: u64,
}

impl Config {
    /// Default heartbeat timeout, per the coordination protocol's pinned value.
    pub const DEFAULT_HEARTBEAT_TIMEOUT_SECS: u64 = 90;
    /// Default liveness monitor sweep interval.
    pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 30;
    /// Default per-agent message queue bound.
    pub const DEFAULT_MAX_QUEUE_LEN: usize = 1000;
    /// Default recent-changes log bound.
    pub const DEFAULT_RECENT_CHANGES_CAP: usize = 100;
    /// Default store-outage tolerance before the process exits non-zero.
    pub const DEFAULT_STORE_RECONNECT_DEADLINE_SECS: u64 = 30;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: "redis://localhost:6379".to_string(),
            log_level: "info".to_string(),
            heartbeat_timeout_secs: Self::DEFAULT_HEARTBEAT_TIMEOUT_SECS,
            monitor_interval_secs: Self::DEFAULT_MONITOR_INTERVAL_SECS,
            status_dir: "/tmp/splitmind-status".to_string(),
            max_queue_len: Self::DEFAULT_MAX_QUEUE_LEN,
            recent_changes_cap: Self::DEFAULT_RECENT_CHANGES_CAP,
            store_reconnect_deadline_secs: Self::DEFAULT_STORE_RECONNECT_DEADLINE_SECS,
        }
    }
}
