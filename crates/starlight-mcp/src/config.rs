//! Server configuration.
//!
//! Loaded from a YAML file; every field has a default so an empty file (or
//! no file at all) yields a working server on `localhost:38000`.

use crate::error::{McpError, McpResult};
use crate::sse::DEFAULT_HEARTBEAT_INTERVAL;
use serde::{Deserialize, Serialize};
use starlight_util::LogLevel;
use std::path::Path;
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 38000;

/// Default server name reported in `serverInfo` and `/health`.
pub const DEFAULT_SERVER_NAME: &str = "star_classifier";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Seconds between `ping` events on the SSE stream.
    pub heartbeat_interval_secs: u64,
    /// Upper bound on a single tool invocation. No bound when unset.
    pub tool_timeout_secs: Option<u64>,
    /// Validate tool arguments against the tool's input schema.
    pub validate_arguments: bool,
    /// Reject tool methods until the initialize handshake completes.
    pub strict_lifecycle: bool,
    /// Log level.
    pub log_level: LogLevel,
    /// CORS policy.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
            tool_timeout_secs: None,
            validate_arguments: true,
            strict_lifecycle: false,
            log_level: LogLevel::Info,
            cors: CorsConfig::default(),
        }
    }
}

/// CORS policy for the HTTP endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Whether to add CORS headers at all.
    pub enabled: bool,
    /// Allowed origins; `"*"` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    /// Whether any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub async fn load(path: &Path) -> McpResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            McpError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text and validate it.
    pub fn from_yaml(content: &str) -> McpResult<Self> {
        // An empty document deserializes to unit, not to a map.
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> McpResult<()> {
        if self.name.trim().is_empty() {
            return Err(McpError::config("name must not be empty"));
        }
        if self.port == 0 {
            return Err(McpError::config("port must be non-zero"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(McpError::config("heartbeat_interval_secs must be non-zero"));
        }
        if self.tool_timeout_secs == Some(0) {
            return Err(McpError::config("tool_timeout_secs must be non-zero when set"));
        }
        Ok(())
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.name, "star_classifier");
        assert_eq!(config.bind_address(), "localhost:38000");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert!(config.tool_timeout().is_none());
        assert!(config.validate_arguments);
        assert!(!config.strict_lifecycle);
        assert!(config.cors.enabled);
        assert!(config.cors.allows_any_origin());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml(
            r#"
port: 8080
heartbeat_interval_secs: 5
tool_timeout_secs: 20
log_level: debug
cors:
  allowed_origins:
    - http://localhost:3000
"#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.cors.enabled);
        assert!(!config.cors.allows_any_origin());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ServerConfig::from_yaml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServerConfig::from_yaml("port: 0").is_err());
        assert!(ServerConfig::from_yaml("heartbeat_interval_secs: 0").is_err());
        assert!(ServerConfig::from_yaml("tool_timeout_secs: 0").is_err());
        assert!(ServerConfig::from_yaml("name: ''").is_err());
        assert!(matches!(
            ServerConfig::from_yaml("port: not-a-number"),
            Err(McpError::Yaml(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let path = temp.path().join("starlight.yaml");
        std::fs::write(&path, "name: github_star_classifier\nport: 9000\n")
            .expect("Failed to write config");

        let config = ServerConfig::load(&path).await.unwrap();
        assert_eq!(config.name, "github_star_classifier");
        assert_eq!(config.port, 9000);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let err = ServerConfig::load(&temp.path().join("missing.yaml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }
}
