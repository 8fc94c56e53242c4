//! Configuration management for the crash dashboard.
//!
//! Configuration is loaded with figment from (highest precedence first):
//! 1. Environment variables prefixed with `CRASH_DASHBOARD_`, nested keys split on `__`
//! 2. A TOML file, `crash_dashboard.toml` in the working directory unless
//!    `CRASH_DASHBOARD_CONFIG` points elsewhere
//! 3. Default values

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::logging::Verbosity;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "crash_dashboard.toml";

/// Environment variable naming an alternate config file.
const CONFIG_PATH_VAR: &str = "CRASH_DASHBOARD_CONFIG";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "CRASH_DASHBOARD_";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input dataset.
    pub data: DataConfig,
    /// Window and chart display.
    pub display: DisplayConfig,
    /// Static chart export.
    pub export: ExportConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Where the crash CSV lives and what its columns are called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV file loaded at start-up.
    pub path: PathBuf,
    /// Column names of the required fields.
    pub columns: ColumnConfig,
}

/// Header names for the six required CSV columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub crash_date: String,
    pub latitude: String,
    pub longitude: String,
    pub county: String,
    pub collision_type: String,
    pub severity: String,
}

/// Window size and chart display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_width: f32,
    pub window_height: f32,
    /// Draw grid lines on the line graph.
    pub show_grid: bool,
    /// Initial zoom of the accident map, in web-map zoom levels.
    pub map_zoom: f64,
}

/// Static PNG/JSON export options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output directory, created on first export.
    pub dir: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Open the exported PNG with the system viewer.
    pub open_after_export: bool,
}

/// Logging options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbosity: Verbosity,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("2017_Crashes_10000_sample.csv"),
            columns: ColumnConfig::default(),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            crash_date: "CRASH_DATE".to_string(),
            latitude: "LAT".to_string(),
            longitude: "LON".to_string(),
            county: "CNTY_NAME".to_string(),
            collision_type: "MANR_COLL_DESCR".to_string(),
            severity: "CRASH_SEVERITY_DESCR".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_width: 1400.0,
            window_height: 800.0,
            show_grid: true,
            map_zoom: 11.0,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            width: 1200,
            height: 800,
            open_after_export: true,
        }
    }
}

impl ColumnConfig {
    /// All configured column names, in load order.
    pub fn names(&self) -> [&str; 6] {
        [
            self.crash_date.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.county.as_str(),
            self.collision_type.as_str(),
            self.severity.as_str(),
        ]
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        let config_file = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(config_file)
    }

    /// Load configuration using a specific TOML file (which may be absent).
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load_from(config_file: PathBuf) -> Result<Self> {
        let config: Config = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for name in self.data.columns.names() {
            if name.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "column names must not be empty".to_string(),
                });
            }
            if !seen.insert(name) {
                return Err(Error::ConfigValidation {
                    message: format!("column '{name}' is configured for more than one field"),
                });
            }
        }

        if self.display.window_width <= 0.0 || self.display.window_height <= 0.0 {
            return Err(Error::ConfigValidation {
                message: "window size must be positive".to_string(),
            });
        }

        if !self.display.map_zoom.is_finite() || self.display.map_zoom < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "map_zoom ({}) must be a non-negative number",
                    self.display.map_zoom
                ),
            });
        }

        if self.export.width == 0 || self.export.height == 0 {
            return Err(Error::ConfigValidation {
                message: "export width and height must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.data.path, PathBuf::from("2017_Crashes_10000_sample.csv"));
        assert_eq!(config.data.columns.crash_date, "CRASH_DATE");
        assert_eq!(config.data.columns.severity, "CRASH_SEVERITY_DESCR");
        assert!(config.display.show_grid);
        assert_eq!(config.display.map_zoom, 11.0);
        assert_eq!(config.export.dir, PathBuf::from("output"));
        assert_eq!(config.logging.verbosity, Verbosity::Normal);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_column() {
        let mut config = Config::default();
        config.data.columns.county = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("must not be empty"));
    }

    #[test]
    fn test_validate_duplicate_column() {
        let mut config = Config::default();
        config.data.columns.longitude = "LAT".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'LAT'"));
    }

    #[test]
    fn test_validate_zero_export_size() {
        let mut config = Config::default();
        config.export.width = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("export width"));
    }

    #[test]
    fn test_validate_negative_zoom() {
        let mut config = Config::default();
        config.display.map_zoom = -1.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.toml");
            let config = Config::load_from(path).expect("defaults should load");
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "crash_dashboard.toml",
                r#"
                [data]
                path = "crashes.csv"

                [data.columns]
                county = "COUNTY"

                [export]
                open_after_export = false

                [logging]
                verbosity = "verbose"
                "#,
            )?;

            let config = Config::load_from(jail.directory().join("crash_dashboard.toml"))
                .expect("config should load");
            assert_eq!(config.data.path, PathBuf::from("crashes.csv"));
            assert_eq!(config.data.columns.county, "COUNTY");
            assert_eq!(config.data.columns.latitude, "LAT");
            assert!(!config.export.open_after_export);
            assert_eq!(config.logging.verbosity, Verbosity::Verbose);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("crash_dashboard.toml", "[export]\nwidth = 640\n")?;
            jail.set_env("CRASH_DASHBOARD_EXPORT__WIDTH", "1024");
            jail.set_env("CRASH_DASHBOARD_DATA__PATH", "other.csv");

            let config = Config::load_from(jail.directory().join("crash_dashboard.toml"))
                .expect("config should load");
            assert_eq!(config.export.width, 1024);
            assert_eq!(config.data.path, PathBuf::from("other.csv"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("crash_dashboard.toml", "[export]\nheight = 0\n")?;

            let result = Config::load_from(jail.directory().join("crash_dashboard.toml"));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }
}
