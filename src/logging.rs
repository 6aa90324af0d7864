//! Logging setup for component-container
//!
//! Every event the container emits uses the [`TARGET`] target: component
//! registration and construction at `DEBUG`, cache hits and fallback lookups
//! at `TRACE`. This module installs a `tracing-subscriber` to print them.
//!
//! # Features
//!
//! - `logging` - Emit tracing events (default)
//! - `logging-json` - JSON structured output (recommended for production)
//! - `logging-pretty` - Human-readable output (recommended for development)
//!
//! Without one of the subscriber features the `init*` functions do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use component_container::logging;
//!
//! // JSON if logging-json is enabled, pretty otherwise
//! logging::init();
//!
//! // Or pick everything explicitly
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .with_source_location()
//!     .compact()
//!     .init();
//! ```

use tracing::Level;

/// Tracing target used by every event this crate emits
pub const TARGET: &str = "component_container";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON structured logging (production default)
    #[default]
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

/// Builder for the global subscriber
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    container_only: bool,
    source_location: bool,
    thread_ids: bool,
    from_env: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::default(),
            container_only: false,
            source_location: false,
            thread_ids: false,
            from_env: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Show everything down to `TRACE` (includes cache hits)
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Show registrations and constructions
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Show warnings only
    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    /// Drop events from other crates
    pub fn container_only(mut self) -> Self {
        self.container_only = true;
        self
    }

    /// Include file names and line numbers
    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    /// Include thread IDs
    pub fn with_thread_ids(mut self) -> Self {
        self.thread_ids = true;
        self
    }

    /// Prefer `RUST_LOG` over the configured level when it is set and valid
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// The `EnvFilter` directive this configuration stands for
    pub fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        if self.container_only {
            format!("{TARGET}={level}")
        } else {
            level
        }
    }

    /// Install the subscriber globally.
    ///
    /// Does nothing if a global subscriber is already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::layer::Layered;
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

        let filter = self
            .from_env
            .then(|| EnvFilter::try_from_default_env().ok())
            .flatten()
            .unwrap_or_else(|| EnvFilter::new(self.directive()));

        let layer: Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => fmt::layer()
                .json()
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .with_thread_ids(self.thread_ids)
                .boxed(),
            // Plain text when JSON support is compiled out
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => fmt::layer()
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .with_thread_ids(self.thread_ids)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .with_thread_ids(self.thread_ids)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_file(self.source_location)
                .with_line_number(self.source_location)
                .with_thread_ids(self.thread_ids)
                .boxed(),
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init();
    }

    /// Install the subscriber (no-op without a subscriber feature)
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings.
///
/// JSON if `logging-json` is enabled, pretty otherwise. `RUST_LOG` wins
/// over the default `DEBUG` level when set.
pub fn init() {
    if cfg!(feature = "logging-json") {
        init_json();
    } else {
        init_pretty();
    }
}

/// Initialize JSON structured logging.
///
/// # Example output
/// ```json
/// {"timestamp":"2024-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering component","id":"db:main"},"target":"component_container"}
/// ```
pub fn init_json() {
    builder().json().from_env().init();
}

/// Initialize human-readable logging.
///
/// # Example output
/// ```text
///   2024-01-01T00:00:00.000Z DEBUG component_container: Registering component, id: db:main
/// ```
pub fn init_pretty() {
    builder().pretty().from_env().init();
}

/// Initialize logging for this crate's events only
pub fn init_container_only() {
    builder().container_only().from_env().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(!builder.container_only);
        assert_eq!(builder.directive(), "debug");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .pretty()
            .with_source_location()
            .container_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.source_location);
        assert_eq!(builder.directive(), "component_container=trace");
    }

    #[test]
    fn test_target_matches_crate_path() {
        // EnvFilter directives like RUST_LOG=component_container=trace rely on this
        assert_eq!(Some(TARGET), module_path!().split("::").next());
    }

    #[test]
    fn test_init_is_idempotent() {
        builder().warn().compact().init();
        builder().warn().compact().init();
    }
}
