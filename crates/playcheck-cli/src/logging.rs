//! `tracing-subscriber` setup
//!
//! `RUST_LOG` wins when set; otherwise the filter follows `-q`/`-v`/`-vv`.
//! Log lines go to stderr so stdout stays clean for listings.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LogFormat};

/// Filter from `RUST_LOG`, falling back to the verbosity default
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber; a second call is a no-op
pub fn init(config: &CliConfig) {
    let filter = env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(config.color.should_color())
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
