use printrack_dsa::LengthPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackerError};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory holding the learn and print directories.
    pub store_root: PathBuf,
    pub learns_dir: String,
    pub prints_dir: String,
    pub length_policy: LengthPolicy,
    /// Worker threads used to score fingerprint files (1 = serial).
    pub scan_threads: usize,
    /// Rows shown by `identify` before the remainder is summarised.
    pub report_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("."),
            learns_dir: "learns".to_string(),
            prints_dir: "prints".to_string(),
            length_policy: LengthPolicy::Wildcard,
            scan_threads: num_cpus::get().clamp(1, 8),
            report_limit: 45,
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| TrackerError::on_open(path, e))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn learns_path(&self) -> PathBuf {
        self.store_root.join(&self.learns_dir)
    }

    pub fn prints_path(&self) -> PathBuf {
        self.store_root.join(&self.prints_dir)
    }
}
