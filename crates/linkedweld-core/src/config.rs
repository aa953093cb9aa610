//! Configuration management for LinkedWeld
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `LINKEDWELD__SECTION__KEY` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::NotificationChannel;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "LINKEDWELD";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Alerting configuration
    pub alerting: AlertingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// TUI configuration
    pub tui: TuiConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP API port
    pub port: u16,
    /// Directory holding the dashboard bundle, served as a fallback
    pub static_dir: Option<String>,
    /// Expose Prometheus metrics on `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: None,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Socket address string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which row store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Ephemeral in-process tables
    #[default]
    Memory,
    /// SQLite database file
    Sqlite,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Storage backend
    pub backend: StorageBackend,
    /// Database URL (SQLite only)
    pub url: String,
    /// Maximum connections
    pub max_connections: u32,
    /// Seed demo data into an empty store on startup
    pub seed_demo_data: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: "sqlite://linkedweld.db".to_string(),
            max_connections: 5,
            seed_demo_data: true,
        }
    }
}

/// Thresholds for document and budget alerts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Documents expiring within this many days raise a warning
    pub document_warning_days: i64,
    /// Documents expiring within this many days (or expired) are critical
    pub document_critical_days: i64,
    /// Budget ratio above which a project raises a warning
    pub budget_warning_ratio: f64,
    /// Budget ratio above which a project is critical
    pub budget_critical_ratio: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            document_warning_days: 90,
            document_critical_days: 30,
            budget_warning_ratio: 0.7,
            budget_critical_ratio: 0.9,
        }
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Run the background sweep while serving
    pub enabled: bool,
    /// Interval between sweeps
    #[serde(with = "humantime_serde")]
    pub check_interval: Duration,
    /// Alert thresholds
    pub thresholds: AlertThresholds,
    /// Outbound notification channels
    pub channels: Vec<NotificationChannel>,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: Duration::from_secs(15 * 60),
            thresholds: AlertThresholds::default(),
            channels: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// TUI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Refresh rate in milliseconds
    pub refresh_rate_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert_eq!(config.alerting.thresholds.document_warning_days, 90);
        assert_eq!(config.alerting.thresholds.document_critical_days, 30);
        assert_eq!(config.alerting.check_interval, Duration::from_secs(900));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[database]
backend = "sqlite"
url = "sqlite://test.db"

[alerting]
check_interval = "5m"

[[alerting.channels]]
type = "webhook"
url = "http://localhost:9999/hook"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.backend, StorageBackend::Sqlite);
        assert_eq!(config.database.url, "sqlite://test.db");
        assert_eq!(config.alerting.check_interval, Duration::from_secs(300));
        assert_eq!(config.alerting.channels.len(), 1);
        assert_eq!(config.alerting.thresholds, AlertThresholds::default());
    }
}
