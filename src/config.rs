use crate::core::matcher::ThresholdPreset;
use crate::core::similarity::Metric;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Engine settings a shell can persist between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum similarity (0-100) for a pair to be reported
    pub threshold: u8,
    pub metric: Metric,
    /// Whether newly found pairs start out marked for removal
    pub default_remove_intent: bool,
    /// Drop records whose key is empty before matching
    pub skip_empty_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: ThresholdPreset::default().value(),
            metric: Metric::default(),
            default_remove_intent: true,
            skip_empty_keys: false,
        }
    }
}

impl Config {
    /// `<config dir>/dupsy/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dupsy").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Load `explicit` if given (it must exist), otherwise the default path if
    /// it exists, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Using config file {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = Config::default();
        assert_eq!(config.threshold, 87);
        assert_eq!(config.metric, Metric::Ratio);
        assert!(config.default_remove_intent);
        assert!(!config.skip_empty_keys);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "threshold = 95\nmetric = \"jaro-winkler\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.threshold, 95);
        assert_eq!(config.metric, Metric::JaroWinkler);
        assert!(config.default_remove_intent);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp_dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "threshold = \"high\"").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
