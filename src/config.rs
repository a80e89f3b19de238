//!
//! Configuration loading for mdnorm. Settings come from `.mdnorm.toml` (or
//! an explicit `--config` path) and are handed to the library by value; the
//! passes themselves read no globals.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalizer::NormalizeOptions;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".mdnorm.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Complete configuration: core pass options plus the anchor mapping that
/// enables the link-repair pass when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub normalize: NormalizeOptions,
    /// Literal heading-text → slug mapping for anchor-link repair.
    pub anchors: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Look for `.mdnorm.toml` in the current directory; fall back to
    /// defaults when absent.
    pub fn discover() -> Result<Self, ConfigError> {
        let candidate = Path::new(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            log::debug!("loading configuration from {DEFAULT_CONFIG_FILE}");
            Self::load(candidate)
        } else {
            log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            Ok(Self::default())
        }
    }
}

/// Commented default configuration, written by `mdnorm init`.
pub fn default_config_template() -> String {
    let template = r#"# mdnorm configuration

[normalize]
# Language token appended to fence openers without one
default-fence-language = "bash"
# Collapse runs of blank lines to a single one
collapse-blank-lines = true
# End files with exactly one newline
ensure-trailing-newline = true

# Literal heading-text -> anchor slug mapping for link repair
# [anchors]
# "Setup" = "setup-guide"
"#;
    template.to_string()
}
