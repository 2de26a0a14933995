use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the server binds to (default: 0.0.0.0:10093)
    #[serde(default = "Config::default_bind_addr")]
    pub bind_addr: String,
    /// Allowed CORS origins. Required unless cors_permissive is true.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Explicitly allow all origins (development only). Defaults to false.
    #[serde(default)]
    pub cors_permissive: bool,
    /// Routes service client configuration
    #[serde(default)]
    pub routes_service: RoutesServiceConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn default_bind_addr() -> String {
        "0.0.0.0:10093".to_string()
    }
}

/// Configuration for the external routes service
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesServiceConfig {
    /// Base URL of the routes service (default: http://localhost:10094)
    #[serde(default = "RoutesServiceConfig::default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "RoutesServiceConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RoutesServiceConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl RoutesServiceConfig {
    fn default_base_url() -> String {
        "http://localhost:10094".to_string()
    }

    fn default_timeout_secs() -> u64 {
        10
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_falls_back_to_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:10093");
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_permissive);
        assert_eq!(config.routes_service.base_url, "http://localhost:10094");
        assert_eq!(config.routes_service.timeout_secs, 10);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let yaml = r#"
bind_addr: "127.0.0.1:9000"
cors_origins:
  - "https://app.smartbus.club"
routes_service:
  base_url: "http://routes:10094"
  timeout_secs: 5
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.cors_origins, vec!["https://app.smartbus.club"]);
        assert_eq!(config.routes_service.base_url, "http://routes:10094");
        assert_eq!(config.routes_service.timeout_secs, 5);
    }
}
