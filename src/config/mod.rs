//! Configuration management.
//!
//! Configuration is read from a TOML file and then adjusted by `PARLEY_*`
//! environment variables. Every field has a default, so a missing file is
//! not an error.

use crate::models::BaseMessage;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default role of the seed message.
pub const DEFAULT_SEED_ROLE: &str = "system";

/// Default content of the seed message.
pub const DEFAULT_SEED_CONTENT: &str = "You are a helpful personal assistant. Answer clearly and concisely, \
     and ask a follow-up question when a request is ambiguous.";

/// Main configuration for parley.
#[derive(Debug, Clone, PartialEq)]
pub struct ParleyConfig {
    /// Directory holding durable storage.
    pub data_dir: PathBuf,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Seed message placed at the start of every new conversation.
    pub seed: SeedMessageConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Completion client settings.
    pub completion: CompletionConfig,
}

/// Persistence backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackendKind {
    /// `SQLite` database file.
    #[default]
    Sqlite,
    /// One JSON file per conversation.
    Filesystem,
    /// In-process map, lost on exit.
    Memory,
}

impl StorageBackendKind {
    /// Parses a backend name. Returns `None` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "filesystem" | "fs" | "file" => Some(Self::Filesystem),
            "memory" | "mem" | "in-memory" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Returns the canonical backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Filesystem => "filesystem",
            Self::Memory => "memory",
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageConfig {
    /// Which backend holds the conversations.
    pub backend: StorageBackendKind,
}

/// Seed message settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMessageConfig {
    /// Seed role.
    pub role: String,
    /// Seed content.
    pub content: String,
}

impl Default for SeedMessageConfig {
    fn default() -> Self {
        Self {
            role: DEFAULT_SEED_ROLE.to_string(),
            content: DEFAULT_SEED_CONTENT.to_string(),
        }
    }
}

impl SeedMessageConfig {
    /// Returns the seed as a base message.
    #[must_use]
    pub fn to_message(&self) -> BaseMessage {
        BaseMessage::new(&self.role, &self.content)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4943,
        }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingSettings {
    /// "pretty" or "json".
    pub format: Option<String>,
    /// `EnvFilter` directive, e.g. `parley=debug,tower_http=info`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Completion client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Chat completions API base URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 1.0,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Seed section.
    pub seed: Option<ConfigFileSeed>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Completion section.
    pub completion: Option<ConfigFileCompletion>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Backend name.
    pub backend: Option<String>,
}

/// Seed section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSeed {
    /// Seed role.
    pub role: Option<String>,
    /// Seed content.
    pub content: Option<String>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind address.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Log format.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Completion section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCompletion {
    /// API base URL.
    pub endpoint: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl Default for ParleyConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageConfig::default(),
            seed: SeedMessageConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingSettings::default(),
            completion: CompletionConfig::default(),
        }
    }
}

/// Returns the platform data directory for parley, or `.parley` if unknown.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".parley"),
        |dirs| dirs.data_dir().join("parley"),
    )
}

impl ParleyConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/parley/` on macOS)
    /// 2. XDG config dir (`~/.config/parley/`)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("parley").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("parley")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file"),
            }
        }

        Self::default()
    }

    /// Loads configuration with the full precedence chain.
    ///
    /// An explicit path wins, then `PARLEY_CONFIG_PATH`, then the default
    /// locations. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            Self::load_from_file(path)?
        } else if let Some(path) = std::env::var("PARLEY_CONFIG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            Self::load_from_file(Path::new(&path))?
        } else {
            Self::load_default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `PARLEY_*` overrides using the supplied variable lookup.
    ///
    /// Recognized variables: `PARLEY_DATA_DIR`, `PARLEY_STORAGE_BACKEND`,
    /// `PARLEY_SERVER_HOST`, `PARLEY_SERVER_PORT`, `PARLEY_LOG_FORMAT`,
    /// `PARLEY_COMPLETION_MODEL`. Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("PARLEY_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("PARLEY_STORAGE_BACKEND") {
            match StorageBackendKind::parse(&raw) {
                Some(kind) => self.storage.backend = kind,
                None => tracing::warn!(value = %raw, "Ignoring unknown PARLEY_STORAGE_BACKEND"),
            }
        }
        if let Some(host) = lookup("PARLEY_SERVER_HOST").filter(|v| !v.is_empty()) {
            self.server.host = host;
        }
        if let Some(raw) = lookup("PARLEY_SERVER_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid PARLEY_SERVER_PORT"),
            }
        }
        if let Some(format) = lookup("PARLEY_LOG_FORMAT").filter(|v| !v.is_empty()) {
            self.logging.format = Some(format);
        }
        if let Some(model) = lookup("PARLEY_COMPLETION_MODEL").filter(|v| !v.is_empty()) {
            self.completion.model = model;
        }
    }

    /// Converts a `ConfigFile` to `ParleyConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(raw) = file.storage.and_then(|s| s.backend) {
            match StorageBackendKind::parse(&raw) {
                Some(kind) => config.storage.backend = kind,
                None => tracing::warn!(value = %raw, "Unknown storage backend, using sqlite"),
            }
        }
        if let Some(seed) = file.seed {
            if let Some(role) = seed.role {
                config.seed.role = role;
            }
            if let Some(content) = seed.content {
                config.seed.content = content;
            }
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
        }
        if let Some(logging) = file.logging {
            config.logging.format = logging.format;
            config.logging.filter = logging.filter;
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(completion) = file.completion {
            if let Some(endpoint) = completion.endpoint {
                config.completion.endpoint = endpoint;
            }
            if let Some(model) = completion.model {
                config.completion.model = model;
            }
            if let Some(temperature) = completion.temperature {
                config.completion.temperature = temperature;
            }
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the storage backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: StorageBackendKind) -> Self {
        self.storage.backend = backend;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case("sqlite", Some(StorageBackendKind::Sqlite))]
    #[test_case("SQLite", Some(StorageBackendKind::Sqlite))]
    #[test_case("fs", Some(StorageBackendKind::Filesystem))]
    #[test_case("filesystem", Some(StorageBackendKind::Filesystem))]
    #[test_case(" memory ", Some(StorageBackendKind::Memory))]
    #[test_case("postgres", None)]
    fn test_backend_kind_parse(raw: &str, expected: Option<StorageBackendKind>) {
        assert_eq!(StorageBackendKind::parse(raw), expected);
    }

    #[test]
    fn test_defaults() {
        let config = ParleyConfig::default();
        assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
        assert_eq!(config.seed.role, "system");
        assert!(!config.seed.content.is_empty());
        assert_eq!(config.server.port, 4943);
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_from_toml() {
        let config = ParleyConfig::from_toml(
            r#"
            data_dir = "/var/lib/parley"

            [storage]
            backend = "filesystem"

            [seed]
            content = "Be brief."

            [server]
            port = 8080

            [logging]
            format = "json"
            file = "/var/log/parley.log"

            [completion]
            model = "gpt-4o-mini"
            temperature = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/parley"));
        assert_eq!(config.storage.backend, StorageBackendKind::Filesystem);
        assert_eq!(config.seed.role, "system");
        assert_eq!(config.seed.content, "Be brief.");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
        assert_eq!(
            config.logging.file,
            Some(PathBuf::from("/var/log/parley.log"))
        );
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert!((config.completion.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        assert!(ParleyConfig::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ParleyConfig::load_from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(err, Err(Error::OperationFailed { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PARLEY_DATA_DIR", "/tmp/parley"),
            ("PARLEY_STORAGE_BACKEND", "memory"),
            ("PARLEY_SERVER_PORT", "9000"),
            ("PARLEY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = ParleyConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/parley"));
        assert_eq!(config.storage.backend, StorageBackendKind::Memory);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_env_overrides_ignore_invalid_values() {
        let mut config = ParleyConfig::default();
        config.apply_env_overrides(|key| match key {
            "PARLEY_SERVER_PORT" => Some("not-a-port".to_string()),
            "PARLEY_STORAGE_BACKEND" => Some("oracle".to_string()),
            _ => None,
        });

        assert_eq!(config.server.port, 4943);
        assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
    }
}
