//! Service defaults
//!
//! Values used when the consumer configuration leaves a setting out.

/// Queue consumer defaults
pub mod consumer {
    /// Seconds between polls of an empty queue
    pub const POLL_FREQUENCY_SECS: u64 = 60;

    /// Events buffered per local consumer queue before the reader blocks
    pub const LOCAL_QUEUE_CAPACITY: usize = 100;

    /// Application workers draining each local consumer queue
    pub const CONSUMER_WORKERS: usize = 1;

    /// Concurrent readers per remote queue
    pub const READERS_PER_QUEUE: usize = 1;

    pub const LOG_LEVEL: &str = "info";
}

/// Environment variable handling
pub mod env {
    /// Prefix for environment overrides, e.g. `SIF3_POLL_FREQUENCY_SECS`
    pub const PREFIX: &str = "SIF3";

    /// Separator for nested keys, e.g. `SIF3_QUEUES__0__MESSAGE_URI`
    pub const SEPARATOR: &str = "__";
}
