//! Pangea configuration.
//!
//! Settings come from a `pangea.toml` file, with `PANGEA_*` environment
//! variables taking precedence:
//!
//! ```toml
//! region = "eu-west-1"
//! output_dir = "build/terraform"
//!
//! [default_tags]
//! ManagedBy = "pangea"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PangeaError, PangeaResult};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "pangea.toml";

pub const ENV_REGION: &str = "PANGEA_REGION";
pub const ENV_PROFILE: &str = "PANGEA_PROFILE";
pub const ENV_OUTPUT_DIR: &str = "PANGEA_OUTPUT_DIR";

/// Configuration shared by every synthesized template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PangeaConfig {
    /// Region used when a template does not name one.
    pub region: String,
    /// Named credentials profile.
    pub profile: Option<String>,
    /// Directory that synthesized `.tf.json` files are written to.
    pub output_dir: PathBuf,
    /// Tags applied by the provider to every taggable resource.
    pub default_tags: BTreeMap<String, String>,
    /// Provider version constraint.
    pub provider_version: String,
}

impl Default for PangeaConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            profile: None,
            output_dir: PathBuf::from("terraform"),
            default_tags: BTreeMap::new(),
            provider_version: "~> 5.0".to_string(),
        }
    }
}

impl PangeaConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> PangeaResult<Self> {
        let config: PangeaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> PangeaResult<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `pangea.toml` from a directory, falling back to defaults when absent.
    pub fn discover(dir: &Path) -> PangeaResult<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::from_file(&path)
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE, dir.display());
            Ok(Self::default())
        }
    }

    /// Apply overrides from `PANGEA_*` environment variables.
    pub fn with_env(self) -> PangeaResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> PangeaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup(ENV_REGION) {
            self.region = region;
        }
        if let Some(profile) = lookup(ENV_PROFILE) {
            self.profile = Some(profile);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_default_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_tags.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> PangeaResult<()> {
        if self.region.trim().is_empty() {
            return Err(PangeaError::Config("region must not be empty".to_string()));
        }
        if self.provider_version.trim().is_empty() {
            return Err(PangeaError::Config(
                "provider_version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
