/// Viewer configuration.
///
/// Loaded from a TOML file (`stormview.toml` by default). Every section is
/// optional and falls back to the defaults below. After the file is read,
/// `.env` is loaded with `dotenv` and `STORMVIEW_SIMULATION_URL` overrides
/// the simulation endpoint so deployments can point at a different model
/// server without editing the file.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::logging::{self, LogLevel};
use crate::model::{AssetKind, RainfallParams};

pub const DEFAULT_CONFIG_PATH: &str = "./stormview.toml";
pub const SIMULATION_URL_ENV: &str = "STORMVIEW_SIMULATION_URL";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/simulate".to_string(),
            timeout_secs: 120,
        }
    }
}

impl SimulationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default design storm, restored on every simulation reset.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RainfallConfig {
    pub total_precipitation_mm: f64,
    pub duration_hours: f64,
}

impl Default for RainfallConfig {
    fn default() -> Self {
        let r = RainfallParams::default();
        Self {
            total_precipitation_mm: r.total_precipitation_mm,
            duration_hours: r.duration_hours,
        }
    }
}

impl From<RainfallConfig> for RainfallParams {
    fn from(c: RainfallConfig) -> Self {
        RainfallParams {
            total_precipitation_mm: c.total_precipitation_mm,
            duration_hours: c.duration_hours,
        }
    }
}

/// Map layer ids each asset kind is drawn in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub pipes: String,
    pub inlets: String,
    pub outlets: String,
    pub drains: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            pipes: "pipes".to_string(),
            inlets: "inlets".to_string(),
            outlets: "outlets".to_string(),
            drains: "storm_drains".to_string(),
        }
    }
}

impl LayerConfig {
    pub fn layer_for(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Pipe => &self.pipes,
            AssetKind::Inlet => &self.inlets,
            AssetKind::Outlet => &self.outlets,
            AssetKind::Drain => &self.drains,
        }
    }

    /// Reverse lookup used for map clicks. Layers not bound to any kind
    /// (basemap, reports, terrain) return `None`.
    pub fn kind_for(&self, layer: &str) -> Option<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .find(|kind| self.layer_for(*kind) == layer)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }

    /// Installs the global logger described by this section.
    pub fn init_logger(&self) -> Result<(), ConfigError> {
        logging::init_logger(self.min_level()?, self.file.as_deref(), self.console_timestamps);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub simulation: SimulationConfig,
    pub rainfall: RainfallConfig,
    pub layers: LayerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Could not read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config TOML: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl ViewerConfig {
    /// Parses a TOML document and validates it. No environment lookups.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies an endpoint override if one is given.
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(url) = endpoint.filter(|u| !u.trim().is_empty()) {
            self.simulation.endpoint = url;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.logging.min_level()?;

        if self.simulation.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("simulation.endpoint is empty".to_string()));
        }
        if self.simulation.timeout_secs == 0 {
            return Err(ConfigError::Invalid("simulation.timeout_secs must be > 0".to_string()));
        }
        if !(self.rainfall.duration_hours > 0.0) {
            return Err(ConfigError::Invalid("rainfall.duration_hours must be > 0".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for kind in AssetKind::ALL {
            let layer = self.layers.layer_for(kind);
            if !seen.insert(layer) {
                return Err(ConfigError::Invalid(format!(
                    "layer '{}' is bound to more than one asset kind",
                    layer
                )));
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, then apply `.env` / environment
/// overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ViewerConfig, ConfigError> {
    let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
    let config = ViewerConfig::from_toml_str(&text)?;

    dotenv::dotenv().ok();
    Ok(config.with_endpoint_override(std::env::var(SIMULATION_URL_ENV).ok()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ViewerConfig::from_toml_str("").expect("empty config should be valid");
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.simulation.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [simulation]
            endpoint = "https://model.example.org/run"

            [rainfall]
            total_precipitation_mm = 75.0

            [layers]
            drains = "drains-3d"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.simulation.endpoint, "https://model.example.org/run");
        assert_eq!(config.simulation.timeout_secs, 120);
        assert_eq!(config.rainfall.total_precipitation_mm, 75.0);
        assert_eq!(config.rainfall.duration_hours, 1.0);
        assert_eq!(config.layers.drains, "drains-3d");
        assert_eq!(config.layers.pipes, "pipes");
    }

    #[test]
    fn test_layer_reverse_lookup() {
        let layers = LayerConfig::default();
        assert_eq!(layers.kind_for("inlets"), Some(AssetKind::Inlet));
        assert_eq!(layers.kind_for("storm_drains"), Some(AssetKind::Drain));
        assert_eq!(layers.kind_for("reports"), None);
    }

    #[test]
    fn test_layer_bound_twice_is_rejected() {
        let err = ViewerConfig::from_toml_str(
            r#"
            [layers]
            inlets = "nodes"
            drains = "nodes"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {:?}", err);
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        let err = ViewerConfig::from_toml_str("[logging]\nlevel = \"chatty\"\n").unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn test_non_positive_or_nan_duration_is_rejected() {
        for value in ["0.0", "-1.0", "nan"] {
            let text = format!("[rainfall]\nduration_hours = {}\n", value);
            let err = ViewerConfig::from_toml_str(&text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{} accepted: {:?}", value, err);
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = ViewerConfig::from_toml_str("[simulation\nendpoint = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_endpoint_override_replaces_file_value() {
        let config = ViewerConfig::default()
            .with_endpoint_override(Some("http://10.0.0.5:9000/simulate".to_string()));
        assert_eq!(config.simulation.endpoint, "http://10.0.0.5:9000/simulate");

        let unchanged = ViewerConfig::default().with_endpoint_override(Some("  ".to_string()));
        assert_eq!(unchanged.simulation.endpoint, SimulationConfig::default().endpoint);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config("/nonexistent/stormview.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
