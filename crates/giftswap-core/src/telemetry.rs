//! Tracing setup for giftswap binaries.
//!
//! [`init_tracing`] installs the global subscriber once per process; later
//! calls are ignored. Filtering comes from `GIFTSWAP_LOG`, then `RUST_LOG`,
//! then the level passed in, which applies to the giftswap crates only.
//! Output goes to stderr so command output on stdout stays clean.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "GIFTSWAP_LOG";

/// Line format for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// Newline-delimited JSON, one object per event.
    Json,
}

/// Filter directives used when neither env variable is set.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,giftswap_core={level},giftswap_state={level},giftswap={level}")
}

fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(format: LogFormat, level: Level) {
    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);

    // try_init fails only when a subscriber is already installed
    let _ = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .json(),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
    };
}
