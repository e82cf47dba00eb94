//! Structured logging setup
//!
//! The gridmat crates emit `tracing` events at their boundaries: factory
//! construction, calculation materialisation, in-place writes, sparse
//! eviction and backend registration. Nothing is printed until a subscriber
//! is installed; [`init_tracing`] installs one.
//!
//! # Example
//!
//! ```ignore
//! use gridmat::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     filter: "gridmat_exec=debug,gridmat_sparse=trace,info".to_string(),
//!     ..TracingConfig::default()
//! })?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (e.g. `RUST_LOG=gridmat_exec=debug`)
//! - `GRIDMAT_LOG_FORMAT`: `pretty` (default), `json` or `compact`
//!
//! Without the `tracing` feature [`init_tracing`] is a no-op.

use anyhow::Result;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "GRIDMAT_LOG_FORMAT";

const DEFAULT_FILTER: &str = "gridmat_core=info,gridmat_sparse=info,gridmat_exec=info,warn";

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line per event
    Compact,
}

impl TracingFormat {
    /// Unknown names fall back to [`TracingFormat::Pretty`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// `EnvFilter` directives
    pub filter: String,
    /// ANSI colours (ignored for JSON)
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_names: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl TracingConfig {
    /// Configuration from `GRIDMAT_LOG_FORMAT` and `RUST_LOG`, with the
    /// given fallbacks for unset variables.
    pub fn from_env_or(format: TracingFormat, filter: &str) -> Self {
        let format = std::env::var(FORMAT_ENV)
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(format);
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| filter.to_string());
        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_names: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::from_env_or(TracingFormat::Pretty, DEFAULT_FILTER)
    }
}

/// Install a global subscriber. Call once at startup; a second call fails.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let layer = fmt::layer()
        .with_target(config.with_target)
        .with_thread_names(config.with_thread_names)
        .with_file(config.with_file)
        .with_line_number(config.with_line_number);

    let layer = match config.format {
        TracingFormat::Pretty => layer.pretty().with_ansi(config.with_ansi).boxed(),
        TracingFormat::Json => layer.json().boxed(),
        TracingFormat::Compact => layer.compact().with_ansi(config.with_ansi).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()?;
    tracing::debug!(format = ?config.format, filter = %config.filter, "tracing initialised");
    Ok(())
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(TracingFormat::parse("json"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse(" Compact "), TracingFormat::Compact);
        assert_eq!(TracingFormat::parse("pretty"), TracingFormat::Pretty);
        assert_eq!(TracingFormat::parse("xml"), TracingFormat::Pretty);
    }

    #[test]
    fn test_explicit_config_keeps_fields() {
        let config = TracingConfig {
            format: TracingFormat::Json,
            filter: "gridmat_exec=trace".into(),
            ..TracingConfig::from_env_or(TracingFormat::Pretty, "off")
        };
        assert_eq!(config.format, TracingFormat::Json);
        assert_eq!(config.filter, "gridmat_exec=trace");
        assert!(config.with_target);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn test_bad_filter_is_an_error() {
        let config = TracingConfig {
            filter: "gridmat_exec=[".into(),
            ..TracingConfig::default()
        };
        assert!(init_tracing(config).is_err());
    }

    #[test]
    fn test_tracing_crates_only_come_with_the_feature() {
        let manifest = include_str!("../Cargo.toml");
        assert!(manifest.contains("tracing = { workspace = true, optional = true }"));
        assert!(manifest.contains("tracing-subscriber = { workspace = true, optional = true }"));
        assert!(manifest.contains(r#"tracing = ["dep:tracing", "dep:tracing-subscriber"]"#));
    }

    #[cfg(not(feature = "tracing"))]
    #[test]
    fn test_init_is_a_noop_without_feature() {
        assert!(init_tracing(TracingConfig::default()).is_ok());
        assert!(init_tracing(TracingConfig::default()).is_ok());
    }
}
