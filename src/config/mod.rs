//! Configuration system for jsonhand.
//!
//! This module provides the defaults the `jsonhand` command starts from. They
//! can be stored in a TOML file and are overridden by command-line flags.
//!
//! # Example
//!
//! ```
//! use jsonhand::config::Config;
//! use jsonhand::jsonpath::ResultMode;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.mode, ResultMode::Value);
//! assert!(config.allow_eval);
//!
//! // Create custom configuration
//! let custom = Config {
//!     mode: ResultMode::Path,
//!     pretty: false,
//!     ..Config::default()
//! };
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::jsonpath::{FindOptions, ResultMode};

/// Configuration for the jsonhand command.
///
/// # Fields
///
/// * `mode` - How matches are reported: "value", "ipath" or "path" (default: "value")
/// * `allow_eval` - Evaluate `[(expr)]` and `[?(expr)]` selectors (default: true)
/// * `debug` - Trace logging level, 0 to 2 (default: 0)
/// * `pretty` - Pretty-print the JSON output (default: true)
/// * `unique` - Drop repeated matches, keeping the first (default: false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// How matches are reported
    #[serde(default)]
    pub mode: ResultMode,

    /// Evaluate filter and computed-index expressions
    #[serde(default = "default_allow_eval")]
    pub allow_eval: bool,

    /// Trace logging level
    #[serde(default)]
    pub debug: u8,

    /// Pretty-print the JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Drop repeated matches
    #[serde(default)]
    pub unique: bool,
}

/// Returns the default for expression evaluation.
fn default_allow_eval() -> bool {
    true
}

/// Returns the default for pretty output.
fn default_pretty() -> bool {
    true
}

impl Default for Config {
    /// Creates a new configuration with default values.
    ///
    /// # Default Values
    ///
    /// * `mode`: value
    /// * `allow_eval`: true
    /// * `debug`: 0
    /// * `pretty`: true
    /// * `unique`: false
    fn default() -> Self {
        Self {
            mode: ResultMode::default(),
            allow_eval: default_allow_eval(),
            debug: 0,
            pretty: default_pretty(),
            unique: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/jsonhand/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("jsonhand");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Query options carrying this configuration's mode, debug level and eval switch.
    pub fn find_options(&self) -> FindOptions<'static> {
        FindOptions::new()
            .mode(self.mode)
            .debug(self.debug)
            .allow_eval(self.allow_eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_eval_default() {
        let config = Config::default();
        assert!(config.allow_eval);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("mode = \"ipath\"\n").unwrap();
        assert_eq!(config.mode, ResultMode::IndexPath);
        assert!(config.allow_eval);
        assert!(config.pretty);
        assert_eq!(config.debug, 0);
    }

    #[test]
    fn test_find_options_follow_config() {
        let config = Config {
            mode: ResultMode::Path,
            allow_eval: false,
            debug: 2,
            ..Default::default()
        };
        let options = config.find_options();
        assert_eq!(options.mode, ResultMode::Path);
        assert!(!options.allow_eval);
        assert_eq!(options.debug, 2);
        assert!(options.scope.is_none());
    }
}
