// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tool configuration
//!
//! Read from `hexloc.yaml` in the working directory when present, or from
//! the file given with `--config`. Files ending in `.json` are parsed as
//! JSON, anything else as YAML. Every field has a default.

use crate::tokengen::DEFAULT_TOKEN_LENGTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "hexloc.yaml";

/// Environment variable that forces strict loading when set to `1`/`true`.
pub const STRICT_ENV: &str = "HEXLOC_STRICT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog used when a command is given no path.
    pub catalog: Option<PathBuf>,
    /// Load catalogs in strict mode.
    pub strict: bool,
    /// Default output of `export`.
    pub export: Option<PathBuf>,
    /// Length of tokens produced by `new-token`.
    pub token_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            strict: false,
            export: None,
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

impl Config {
    /// Load `hexloc.yaml` if it exists. A broken file is reported and
    /// ignored.
    pub fn load_default() -> Self {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        let config = if path.exists() {
            match Self::from_file(path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("failed to load {}: {:#}", DEFAULT_CONFIG_FILE, err);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Load an explicitly named config file. Errors are returned.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            serde_json::from_str(&data).context("parsing JSON config")?
        } else {
            serde_yaml::from_str(&data).context("parsing YAML config")?
        };
        Ok(config)
    }

    /// Apply `HEXLOC_STRICT` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(STRICT_ENV).ok();
        self.with_strict_override(value.as_deref())
    }

    fn with_strict_override(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            let value = value.trim();
            if value == "1" || value.eq_ignore_ascii_case("true") {
                self.strict = true;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn yaml_with_partial_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hexloc.yaml");
        fs::write(&path, "catalog: locale/en.txt\nstrict: true\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.catalog, Some(PathBuf::from("locale/en.txt")));
        assert!(config.strict);
        assert_eq!(config.export, None);
        assert_eq!(config.token_length, DEFAULT_TOKEN_LENGTH);
    }

    #[test]
    fn json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.JSON");
        fs::write(&path, r#"{"token_length": 12, "export": "out/en.bin"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.token_length, 12);
        assert_eq!(config.export, Some(PathBuf::from("out/en.bin")));
        assert!(!config.strict);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hexloc.yaml");
        fs::write(&path, "strict: [not, a, bool\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn strict_override() {
        assert!(Config::default().with_strict_override(Some("1")).strict);
        assert!(Config::default().with_strict_override(Some(" TRUE ")).strict);
        assert!(!Config::default().with_strict_override(Some("0")).strict);
        assert!(!Config::default().with_strict_override(None).strict);
    }
}
