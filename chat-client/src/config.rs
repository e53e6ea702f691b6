//! Configuration loading for chat-client.
//!
//! Configuration is loaded from a TOML file (default: `palaver.toml`).
//! Every section and field is optional.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the chat client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Backend endpoints and credentials.
    #[serde(default)]
    pub server: ServerConfig,
    /// Typing presence configuration.
    #[serde(default)]
    pub typing: TypingConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend endpoints and credentials.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// Push channel URL (default: ws://127.0.0.1:5000/ws).
    #[serde(default = "default_push_url")]
    pub push_url: String,
    /// REST base URL (default: http://127.0.0.1:5000).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token for REST calls (acquired elsewhere).
    #[serde(default)]
    pub token: String,
    /// REST request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("push_url", &self.push_url)
            .field("api_url", &self.api_url)
            .field("token", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Typing presence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TypingConfig {
    /// Inactivity window in milliseconds before typing stops (default: 3000).
    #[serde(default = "default_idle_window_ms")]
    pub idle_window_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_push_url() -> String {
    "ws://127.0.0.1:5000/ws".to_string()
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_idle_window_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            push_url: default_push_url(),
            api_url: default_api_url(),
            token: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            idle_window_ms: default_idle_window_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Set the push channel URL.
    pub fn with_push_url(mut self, url: &str) -> Self {
        self.server.push_url = url.to_string();
        self
    }

    /// Set the REST base URL.
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.server.api_url = url.to_string();
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.server.token = token.to_string();
        self
    }

    /// Set the typing inactivity window.
    pub fn with_idle_window(mut self, window: Duration) -> Self {
        self.typing.idle_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The typing inactivity window.
    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.typing.idle_window_ms)
    }

    /// The REST request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.server.push_url, "ws://127.0.0.1:5000/ws");
        assert_eq!(config.server.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.idle_window(), Duration::from_millis(3000));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
push_url = "wss://chat.example.com/ws"
api_url = "https://chat.example.com"
token = "abc"

[typing]
idle_window_ms = 1500

[logging]
level = "debug"
"#;

        let config: ClientConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.push_url, "wss://chat.example.com/ws");
        assert_eq!(config.server.token, "abc");
        assert_eq!(config.idle_window(), Duration::from_millis(1500));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn config_missing_sections_use_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.typing.idle_window_ms, 3000);
        assert_eq!(config.server.request_timeout_secs, 30);
    }

    #[test]
    fn builder_pattern() {
        let config = ClientConfig::default()
            .with_push_url("ws://x/ws")
            .with_api_url("http://x")
            .with_token("t")
            .with_idle_window(Duration::from_millis(250));

        assert_eq!(config.server.push_url, "ws://x/ws");
        assert_eq!(config.server.api_url, "http://x");
        assert_eq!(config.server.token, "t");
        assert_eq!(config.typing.idle_window_ms, 250);
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig::default().with_token("super-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[typing]\nidle_window_ms = 900").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.typing.idle_window_ms, 900);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let result = ClientConfig::from_file(std::path::Path::new("/nonexistent/palaver.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn from_file_invalid_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[typing]\nidle_window_ms = \"soon\"").unwrap();

        let result = ClientConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }
}
