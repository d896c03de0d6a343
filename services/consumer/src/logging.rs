//! Tracing subscriber setup for applications embedding the consumer

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (normally
/// `ConsumerEnvironment::log_level`) applies. Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
