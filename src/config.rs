// ⚙️ Configuration - data location, chart geometry, logging
// Loaded from an optional JSON file; CLI flags override on top

use crate::chart::{ChartGeometry, ChartMode, DEFAULT_MAX_AXIS};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding stats.csv / news.csv
    pub data_dir: PathBuf,

    pub chart_mode: ChartMode,

    /// Top of the shared chart axis (default: 50)
    pub max_axis: f64,

    /// Multiplier on plotted size; never touches the series values
    pub size_factor: f64,

    /// Where logs go in TUI mode (stdout would corrupt the screen)
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: PathBuf::from("data"),
            chart_mode: ChartMode::Radial,
            max_axis: DEFAULT_MAX_AXIS,
            size_factor: 1.0,
            log_file: PathBuf::from("player-compare.log"),
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub chart_mode: Option<ChartMode>,
    pub size_factor: Option<f64>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load config from a JSON file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides on top of the loaded values, then re-validate
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(mode) = overrides.chart_mode {
            self.chart_mode = mode;
        }
        if let Some(size) = overrides.size_factor {
            self.size_factor = size;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_axis.is_finite() && self.max_axis > 0.0) {
            bail!("max_axis must be a positive number, got {}", self.max_axis);
        }
        if !(self.size_factor.is_finite() && self.size_factor > 0.0) {
            bail!("size_factor must be a positive number, got {}", self.size_factor);
        }
        Ok(())
    }

    pub fn geometry(&self) -> ChartGeometry {
        ChartGeometry::new(self.chart_mode, self.max_axis, self.size_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"chart_mode": "cartesian", "size_factor": 1.5}"#).unwrap();

        assert_eq!(config.chart_mode, ChartMode::Cartesian);
        assert_eq!(config.size_factor, 1.5);
        assert_eq!(config.max_axis, 50.0);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.max_axis = 0.0;
        assert!(config.validate().is_err());

        config.max_axis = 50.0;
        config.size_factor = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let mut config: AppConfig = serde_json::from_str(
            r#"{"data_dir": "from-file", "chart_mode": "cartesian", "size_factor": 1.5}"#,
        )
        .unwrap();

        config
            .apply_overrides(ConfigOverrides {
                data_dir: Some(PathBuf::from("from-cli")),
                size_factor: Some(2.0),
                ..ConfigOverrides::default()
            })
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("from-cli"));
        assert_eq!(config.size_factor, 2.0);
        assert_eq!(config.chart_mode, ChartMode::Cartesian, "not overridden");
        assert_eq!(config.log_file, PathBuf::from("player-compare.log"));
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(ConfigOverrides {
            size_factor: Some(-1.0),
            ..ConfigOverrides::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_geometry() {
        let config = AppConfig {
            chart_mode: ChartMode::Cartesian,
            size_factor: 2.0,
            ..AppConfig::default()
        };
        assert_eq!(config.geometry().extent(), 100.0);
        assert_eq!(config.geometry().mode, ChartMode::Cartesian);
    }
}
