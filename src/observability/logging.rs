//! Logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Default filter directive.
pub const DEFAULT_FILTER: &str = "info";

/// Filter directive used with `--verbose`.
pub const VERBOSE_FILTER: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name. Unknown names fall back to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Append to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolves logging from config settings and the process environment.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Resolves logging with an explicit variable lookup.
    ///
    /// The filter comes from `PARLEY_LOG`, then `RUST_LOG`, then `--verbose`,
    /// then the config file, then [`DEFAULT_FILTER`].
    pub fn resolve(
        settings: &LoggingSettings,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let env_filter = ["PARLEY_LOG", "RUST_LOG"]
            .into_iter()
            .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()));

        let filter = env_filter
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.filter.clone())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let format = lookup("PARLEY_LOG_FORMAT")
            .or_else(|| settings.format.clone())
            .map_or_else(LogFormat::default, |f| LogFormat::parse(&f));

        Self {
            format,
            filter,
            file: settings.file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("json", LogFormat::Json)]
    #[test_case("JSON", LogFormat::Json)]
    #[test_case("pretty", LogFormat::Pretty)]
    #[test_case("xml", LogFormat::Pretty)]
    fn test_format_parse(raw: &str, expected: LogFormat) {
        assert_eq!(LogFormat::parse(raw), expected);
    }

    #[test]
    fn test_defaults_without_settings() {
        let config = LoggingConfig::resolve(&LoggingSettings::default(), false, |_| None);
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_verbose_beats_config_file() {
        let settings = LoggingSettings {
            filter: Some("warn".to_string()),
            ..LoggingSettings::default()
        };
        assert_eq!(LoggingConfig::resolve(&settings, true, |_| None).filter, "debug");
        assert_eq!(LoggingConfig::resolve(&settings, false, |_| None).filter, "warn");
    }

    #[test]
    fn test_env_beats_everything() {
        let settings = LoggingSettings {
            format: Some("pretty".to_string()),
            filter: Some("warn".to_string()),
            file: None,
        };
        let config = LoggingConfig::resolve(&settings, true, |key| match key {
            "RUST_LOG" => Some("parley=trace".to_string()),
            "PARLEY_LOG_FORMAT" => Some("json".to_string()),
            _ => None,
        });
        assert_eq!(config.filter, "parley=trace");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_parley_log_beats_rust_log() {
        let config = LoggingConfig::resolve(&LoggingSettings::default(), false, |key| match key {
            "PARLEY_LOG" => Some("parley=debug".to_string()),
            "RUST_LOG" => Some("error".to_string()),
            _ => None,
        });
        assert_eq!(config.filter, "parley=debug");
    }
}
