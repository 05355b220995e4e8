use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Project base directory used when nothing else is configured.
pub const DEFAULT_BASE_DIRECTORY: &str = "force-app/main/default";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = ".perms.toml";

const PERMISSION_SUBDIR: &str = "permissionsets";
const OBJECT_SUBDIR: &str = "objects";

/// Where permission sets and object definitions live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermsConfig {
    pub base_directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_directory: Option<PathBuf>,
}

impl Default for PermsConfig {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from(DEFAULT_BASE_DIRECTORY),
            permission_directory: None,
            object_directory: None,
        }
    }
}

/// Directory settings given on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_directory: Option<PathBuf>,
    pub permission_directory: Option<PathBuf>,
    pub object_directory: Option<PathBuf>,
}

impl ConfigOverrides {
    fn is_conflicting(&self) -> bool {
        self.base_directory.is_some()
            && self.permission_directory.is_some()
            && self.object_directory.is_some()
    }
}

impl PermsConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&text)
    }

    /// Load `explicit` if given, else `DEFAULT_CONFIG_FILE` under `cwd` if
    /// it exists, else the built-in default.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = cwd.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            return Self::load(&implicit);
        }
        Ok(Self::default())
    }

    /// Layer command-line settings on top of this config.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if overrides.is_conflicting() {
            return Err(ConfigError::Conflicting);
        }
        if let Some(base) = &overrides.base_directory {
            self.base_directory = base.clone();
        }
        if let Some(dir) = &overrides.permission_directory {
            self.permission_directory = Some(dir.clone());
        }
        if let Some(dir) = &overrides.object_directory {
            self.object_directory = Some(dir.clone());
        }
        Ok(self)
    }

    pub fn permission_directory(&self) -> PathBuf {
        self.permission_directory
            .clone()
            .unwrap_or_else(|| self.base_directory.join(PERMISSION_SUBDIR))
    }

    pub fn object_directory(&self) -> PathBuf {
        self.object_directory
            .clone()
            .unwrap_or_else(|| self.base_directory.join(OBJECT_SUBDIR))
    }
}
