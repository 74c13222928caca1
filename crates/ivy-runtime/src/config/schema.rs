//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use ivy_core::reply::DEFAULT_COLOR;
use ivy_core::{GuildId, UserId};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// ```toml
/// name = "stonks"
/// prefix = "."
/// super_perms = ["268044207854632960"]
/// report_errors = ["749978305549041734"]
/// color = 0x2f3136
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvyConfig {
    /// Bot name, used as the logging scope.
    #[serde(default = "default_name")]
    pub name: String,

    /// Prefix for the default guild data provider.
    ///
    /// Must be set unless the application supplies its own provider, and
    /// must not be set when it does.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Users allowed to run every command.
    #[serde(default)]
    pub super_perms: Vec<UserId>,

    /// Guilds that receive verbose error reports and internal commands.
    #[serde(default)]
    pub report_errors: Vec<GuildId>,

    /// Accent colour of framework embeds.
    #[serde(default = "default_color")]
    pub color: u32,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for IvyConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            prefix: None,
            super_perms: Vec::new(),
            report_errors: Vec::new(),
            color: default_color(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_name() -> String {
    "ivy".to_string()
}

fn default_color() -> u32 {
    DEFAULT_COLOR
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// How often the log file rolls over.
    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target levels, e.g. `ivy_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Needs the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Output destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IvyConfig::default();
        assert_eq!(config.name, "ivy");
        assert_eq!(config.color, DEFAULT_COLOR);
        assert!(config.prefix.is_none());
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.output, LogOutput::Stdout);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: IvyConfig = serde_json::from_str(
            r#"{ "prefix": "!", "super_perms": ["1"], "logging": { "level": "debug", "filters": { "ivy_framework": "trace" } } }"#,
        )
        .unwrap();

        assert_eq!(config.prefix.as_deref(), Some("!"));
        assert_eq!(config.super_perms, vec![UserId::new("1")]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["ivy_framework"], LogLevel::Trace);
        assert_eq!(config.name, "ivy");
    }
}
