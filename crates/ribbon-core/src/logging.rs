#![forbid(unsafe_code)]

//! Logging entry points.
//!
//! With the `tracing` feature the usual macros are re-exported so downstream
//! crates can write `ribbon_core::debug!`. With `subscriber`, [`init`] wires
//! a `tracing-subscriber` fmt layer filtered by `RIBBON_LOG`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_ENV: &str = "RIBBON_LOG";

/// Output format for [`init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Install a global subscriber. Returns `false` if one was already set.
///
/// The filter defaults to `warn` when `RIBBON_LOG` is unset or invalid.
#[cfg(feature = "subscriber")]
pub fn init(format: LogFormat) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
