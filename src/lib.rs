//! Application shell: wires the telemetry and versioning adapters into the
//! single long-lived handle the rest of the platform borrows from.

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use reclamo_domain::ReclamoConfig;

pub mod runtime;

pub use runtime::ControlPlane;

/// Loads configuration for the operator bins. An explicitly given path must
/// exist; with no path, `~/.reclamo/config.yaml` is used when present and
/// defaults otherwise.
pub fn load_config(explicit: Option<PathBuf>) -> Result<ReclamoConfig> {
    match explicit {
        Some(path) => ReclamoConfig::load_from_path(&path),
        None => {
            let path = default_config_path();
            if path.exists() {
                ReclamoConfig::load_from_path(&path)
            } else {
                Ok(ReclamoConfig::default())
            }
        }
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".reclamo").join("config.yaml");
    }
    PathBuf::from("reclamo-config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_path_must_exist() {
        let err = load_config(Some(PathBuf::from("/nonexistent/reclamo.yaml")))
            .expect_err("missing explicit config");
        assert!(err.to_string().contains("reading config file"));
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "telemetry:\n  health_interval_secs: 5").expect("write config");

        let config = load_config(Some(file.path().to_path_buf())).expect("load");
        assert_eq!(config.telemetry.health_interval_secs, 5);
    }
}
