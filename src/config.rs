use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::scanner::WalkOptions;

/// Upper bound for the pause between two deletions.
pub const MAX_PACING_MS: u64 = 10_000;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub cleanup: CleanupConfig,
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Walker threads (0 = auto)
    pub workers: usize,
    /// Directory names never reported or entered
    pub skip_dirs: Vec<String>,
    /// Maximum depth below the root (0 = unlimited)
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Pause between deletions in the TUI, in milliseconds
    pub pacing_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Event poll interval in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            skip_dirs: vec![".git".to_string()],
            max_depth: 0,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { pacing_ms: 100 }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 100 }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file there means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// `<config dir>/devtidy/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("devtidy").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tui.tick_rate_ms == 0 {
            return Err(ConfigError::Invalid(
                "tui.tick_rate_ms must be greater than 0".into(),
            ));
        }
        if self.cleanup.pacing_ms > MAX_PACING_MS {
            return Err(ConfigError::Invalid(format!(
                "cleanup.pacing_ms must be at most {MAX_PACING_MS}"
            )));
        }
        if let Some(bad) = self
            .scan
            .skip_dirs
            .iter()
            .find(|name| name.is_empty() || name.contains('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "scan.skip_dirs entry '{bad}' must be a plain directory name"
            )));
        }
        Ok(())
    }

    /// Walker options from the `[scan]` table.
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::new()
            .with_workers(self.scan.workers)
            .with_skip_dirs(self.scan.skip_dirs.clone())
            .with_max_depth((self.scan.max_depth > 0).then_some(self.scan.max_depth))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.cleanup.pacing_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tui.tick_rate_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cleanup.pacing_ms, 100);
        assert_eq!(config.tui.tick_rate_ms, 100);
    }

    #[test]
    fn config_serializes_to_toml() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[scan]"));
        assert!(toml_str.contains("[cleanup]"));
    }

    #[test]
    fn zero_tick_rate_is_invalid() {
        let mut config = Config::default();
        config.tui.tick_rate_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn excessive_pacing_is_invalid() {
        let mut config = Config::default();
        config.cleanup.pacing_ms = MAX_PACING_MS + 1;
        assert!(config.validate().is_err());
        config.cleanup.pacing_ms = MAX_PACING_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn skip_dirs_must_be_names() {
        let mut config = Config::default();
        config.scan.skip_dirs = vec!["a/b".into()];
        assert!(config.validate().is_err());
        config.scan.skip_dirs = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn walk_options_map_zero_depth_to_unlimited() {
        let mut config = Config::default();
        assert_eq!(config.walk_options().max_depth, None);
        config.scan.max_depth = 4;
        config.scan.workers = 3;
        let options = config.walk_options();
        assert_eq!(options.max_depth, Some(4));
        assert_eq!(options.workers, 3);
        assert_eq!(options.skip_dirs, vec![".git".to_string()]);
    }
}
