//! YAML configuration for the control plane.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::health::AlertThresholds;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclamoConfig {
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub thresholds: AlertThresholds,
    /// Seconds between evaluations of the periodic health loop.
    pub health_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            health_interval_secs: 60,
        }
    }
}

impl ReclamoConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_yaml_overrides_keep_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "telemetry:\n  thresholds:\n    error_rate_percent: 2.5\n  health_interval_secs: 15"
        )
        .expect("write config");

        let config = ReclamoConfig::load_from_path(file.path()).expect("load config");
        assert_eq!(config.telemetry.thresholds.error_rate_percent, 2.5);
        assert_eq!(config.telemetry.thresholds.memory_mb, 512.0);
        assert_eq!(config.telemetry.health_interval_secs, 15);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{{}}").expect("write config");

        let config = ReclamoConfig::load_from_path(file.path()).expect("load config");
        assert_eq!(config.telemetry.health_interval_secs, 60);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ReclamoConfig::load_from_path(Path::new("/nonexistent/reclamo.yaml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("reading config file"));
    }
}
