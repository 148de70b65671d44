//! Structured logging initialisation.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`. Returns `false` when a
/// subscriber was already installed.
pub fn init_logging(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("qa_engine={default_level}").into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}

/// Valid values for the `log_level` configuration key.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn is_valid_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
}
