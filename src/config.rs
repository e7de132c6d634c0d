use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::haversine::DEFAULT_WALKING_SPEED_M_PER_MIN;
use crate::itinerary::{property_sale_itinerary, Stop};
use crate::router::{RouteOptions, DEFAULT_CIRCUITY_RATIO};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Stops to route. The built-in property-sale itinerary is used when absent.
    #[serde(default)]
    pub itinerary: Option<Vec<Stop>>,
}

/// Connection settings for the PostGIS/pgRouting database
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_host")]
    pub host: String,
    #[serde(default = "DatabaseConfig::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseConfig::default_name")]
    pub name: String,
    #[serde(default = "DatabaseConfig::default_user")]
    pub user: String,
    #[serde(default = "DatabaseConfig::default_password")]
    pub password: String,
    /// Timeout for a single connection attempt (default: 10)
    #[serde(default = "DatabaseConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// How long to wait for the database to come up (default: 120)
    #[serde(default = "DatabaseConfig::default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    /// Pause between readiness attempts (default: 3)
    #[serde(default = "DatabaseConfig::default_ready_poll_secs")]
    pub ready_poll_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            name: Self::default_name(),
            user: Self::default_user(),
            password: Self::default_password(),
            connect_timeout_secs: Self::default_connect_timeout_secs(),
            ready_timeout_secs: Self::default_ready_timeout_secs(),
            ready_poll_secs: Self::default_ready_poll_secs(),
        }
    }
}

impl DatabaseConfig {
    fn default_host() -> String {
        "db".to_string()
    }
    fn default_port() -> u16 {
        5432
    }
    fn default_name() -> String {
        "ruteo_resiliente".to_string()
    }
    fn default_user() -> String {
        "postgres".to_string()
    }
    fn default_password() -> String {
        "postgres".to_string()
    }
    fn default_connect_timeout_secs() -> u64 {
        10
    }
    fn default_ready_timeout_secs() -> u64 {
        120
    }
    fn default_ready_poll_secs() -> u64 {
        3
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_out_dir")]
    pub out_dir: PathBuf,
    /// Directory served by the web app; the route is copied there if it exists.
    #[serde(default)]
    pub web_data_dir: Option<PathBuf>,
    #[serde(default = "OutputConfig::default_file_name")]
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            web_data_dir: None,
            file_name: Self::default_file_name(),
        }
    }
}

impl OutputConfig {
    fn default_out_dir() -> PathBuf {
        PathBuf::from("out")
    }
    fn default_file_name() -> String {
        "route.geojson".to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "RoutingConfig::default_circuity_ratio")]
    pub circuity_ratio: f64,
    #[serde(default = "RoutingConfig::default_walking_speed")]
    pub walking_speed_m_per_min: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            circuity_ratio: Self::default_circuity_ratio(),
            walking_speed_m_per_min: Self::default_walking_speed(),
        }
    }
}

impl RoutingConfig {
    fn default_circuity_ratio() -> f64 {
        DEFAULT_CIRCUITY_RATIO
    }
    fn default_walking_speed() -> f64 {
        DEFAULT_WALKING_SPEED_M_PER_MIN
    }

    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            circuity_ratio: self.circuity_ratio,
            walking_speed_m_per_min: self.walking_speed_m_per_min,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.routing.circuity_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "circuity_ratio must be positive, got {}",
                self.routing.circuity_ratio
            )));
        }
        if !(self.routing.walking_speed_m_per_min > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "walking_speed_m_per_min must be positive, got {}",
                self.routing.walking_speed_m_per_min
            )));
        }
        Ok(())
    }

    pub fn stops(&self) -> Vec<Stop> {
        self.itinerary.clone().unwrap_or_else(property_sale_itinerary)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_yaml("").expect("defaults");
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "ruteo_resiliente");
        assert_eq!(config.routing.circuity_ratio, 2.5);
        assert_eq!(config.output.file_name, "route.geojson");
        assert_eq!(config.stops().len(), 3);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = Config::from_yaml(
            "database:\n  host: localhost\nrouting:\n  circuity_ratio: 5.0\noutput:\n  web_data_dir: /webdata\n",
        )
        .expect("parse");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.user, "postgres");
        assert_eq!(config.routing.circuity_ratio, 5.0);
        assert_eq!(config.routing.walking_speed_m_per_min, 83.33);
        assert_eq!(config.output.web_data_dir, Some(PathBuf::from("/webdata")));
        assert_eq!(config.output.out_dir, PathBuf::from("out"));
    }

    #[test]
    fn custom_itinerary_replaces_builtin() {
        let config = Config::from_yaml(
            "itinerary:\n  - name: A\n    kind: notary\n    lat: -33.44\n    lng: -70.65\n    handling_minutes: 10\n  - name: B\n    kind: tax_office\n    lat: -33.43\n    lng: -70.65\n    handling_minutes: 5\n",
        )
        .expect("parse");
        let stops = config.stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].name, "B");
    }

    #[test]
    fn rejects_non_positive_ratio() {
        let err = Config::from_yaml("routing:\n  circuity_ratio: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reports_parse_errors() {
        let err = Config::from_yaml("database: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn example_config_loads() {
        let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml"))
            .expect("example config");
        assert_eq!(config.output.file_name, "ruta_dijkstra.geojson");
        assert_eq!(config.output.web_data_dir, Some(PathBuf::from("/webdata")));
        assert!(config.itinerary.is_none());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load("/nonexistent/ruteo.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }
}
