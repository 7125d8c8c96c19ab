//! Logging infrastructure for Strata.
//!
//! Structured logging controlled by the `STRATA_DEBUG` environment variable.
//!
//! # Environment Variables
//!
//! - `STRATA_DEBUG=true` / `STRATA_DEBUG=1` - Enable debug logging
//! - `STRATA_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `STRATA_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use strata_query::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```
//!
//! # What gets logged
//!
//! - `debug`: compiled SQL, the two-pass pagination decision, emitted root counts
//! - `trace`: every row pushed through the reifier
//! - `warn`: row streams that break root contiguity

use std::env;
use std::str::FromStr;
use std::sync::Once;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::Level;

static INIT: Once = Once::new();

const UNSET: u8 = 0;
const OFF: u8 = 1;
const ON: u8 = 2;

// `STRATA_DEBUG` is read once; the reifier checks it for every row.
static DEBUG: AtomicU8 = AtomicU8::new(UNSET);

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    Compact,
}

impl LogFormat {
    /// Parse a format name. Unknown names fall back to JSON.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Check if debug logging is enabled.
///
/// `STRATA_DEBUG` counts as set for "true", "1" or "yes" (case-insensitive).
/// [`set_debug`] overrides it.
#[inline]
pub fn is_debug_enabled() -> bool {
    match DEBUG.load(Ordering::Relaxed) {
        ON => true,
        OFF => false,
        _ => {
            let on = env::var("STRATA_DEBUG").is_ok_and(|v| is_truthy(&v));
            set_debug(on);
            on
        }
    }
}

/// Turn the `strata_debug!` and `strata_trace!` macros on or off.
pub fn set_debug(on: bool) {
    DEBUG.store(if on { ON } else { OFF }, Ordering::Relaxed);
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// The configured log level.
///
/// Read from `STRATA_LOG_LEVEL`; defaults to `DEBUG` when debug logging is
/// enabled and `WARN` otherwise.
pub fn log_level() -> Level {
    resolve_level(env::var("STRATA_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

fn resolve_level(configured: Option<&str>, debug: bool) -> Level {
    let fallback = if debug { Level::DEBUG } else { Level::WARN };
    configured
        .and_then(|level| Level::from_str(level).ok())
        .unwrap_or(fallback)
}

/// The configured output format, from `STRATA_LOG_FORMAT`.
pub fn log_format() -> LogFormat {
    env::var("STRATA_LOG_FORMAT")
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Initialize the Strata logging system.
///
/// Installs a subscriber only when `STRATA_DEBUG` or `STRATA_LOG_LEVEL` is
/// set. Subsequent calls are no-ops. Without the `tracing-subscriber`
/// feature nothing is installed and events go to whatever subscriber the
/// application sets up.
pub fn init() {
    if !is_debug_enabled() && env::var("STRATA_LOG_LEVEL").is_err() {
        return;
    }
    install(log_level(), log_format());
}

/// Initialize logging at `level`, regardless of the environment.
pub fn init_with_level(level: Level) {
    install(level, log_format());
}

/// Initialize logging for debugging (convenience function).
///
/// Enables the debug macros and installs a `DEBUG` subscriber.
pub fn init_debug() {
    set_debug(true);
    install(Level::DEBUG, log_format());
}

#[cfg_attr(not(feature = "tracing-subscriber"), allow(unused_variables))]
fn install(level: Level, format: LogFormat) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let directives = ["strata", "strata_query", "strata_schema"]
                .map(|target| format!("{}={}", target, level))
                .join(",");
            let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            match format {
                LogFormat::Json => registry.with(fmt::layer().json()).init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
            }

            tracing::info!(level = %level, format = format.as_str(), "Strata logging initialized");
        }
    });
}

/// Macro for conditional debug logging.
///
/// Only logs if debug logging is enabled at runtime.
#[macro_export]
macro_rules! strata_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional trace logging.
#[macro_export]
macro_rules! strata_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_level() {
        assert_eq!(resolve_level(None, false), Level::WARN);
        assert_eq!(resolve_level(None, true), Level::DEBUG);
        assert_eq!(resolve_level(Some("trace"), false), Level::TRACE);
        assert_eq!(resolve_level(Some("ERROR"), true), Level::ERROR);
        assert_eq!(resolve_level(Some("loud"), false), Level::WARN);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
        assert_eq!(LogFormat::default().as_str(), "json");
    }

    #[test]
    fn test_truthy() {
        assert!(is_truthy("YES"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("off"));
    }
}
