//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/catree/catree.toml`
//! 3. Local config: `<dir>/.catree.toml`
//! 4. Environment variables: `CATREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Actor, Limits, ModuleCatalog};

/// Raw limits for intermediate parsing; `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLimits {
    pub max_depth: Option<usize>,
    pub max_customize_categories: Option<usize>,
    pub max_using_categories: Option<usize>,
}

/// Raw actor for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawActor {
    pub uid: Option<String>,
    pub name: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub store_path: Option<PathBuf>,
    pub extended_scope: Option<bool>,
    pub linked_entries: Option<u64>,
    pub limits: RawLimits,
    pub actor: RawActor,
}

/// Unified configuration for catree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// JSON snapshot holding every category, node and module row
    pub store_path: PathBuf,
    /// Enable the info resource catalog module
    pub extended_scope: bool,
    /// Entries the registry reports as linked to the information system category
    pub linked_entries: u64,
    pub limits: Limits,
    /// Acting user stamped onto every write
    pub actor: Actor,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            extended_scope: false,
            linked_entries: 0,
            limits: Limits::default(),
            actor: Actor::new("admin", "Administrator"),
        }
    }
}

/// Default snapshot location (XDG data dir, falling back to ~/.catree).
fn default_store_path() -> PathBuf {
    ProjectDirs::from("", "", "catree")
        .map(|dirs| dirs.data_dir().join("catree.json"))
        .unwrap_or_else(|| PathBuf::from("~/.catree/catree.json"))
}

/// Get the XDG config directory for catree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "catree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("catree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".catree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in the store path.
    fn expand_paths(&mut self) -> Result<(), ApplicationError> {
        let raw = self.store_path.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw).map_err(|e| ApplicationError::Config {
            message: format!("expand store_path {}: {}", raw, e),
        })?;
        self.store_path = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            store_path: overlay
                .store_path
                .clone()
                .unwrap_or_else(|| self.store_path.clone()),
            extended_scope: overlay.extended_scope.unwrap_or(self.extended_scope),
            linked_entries: overlay.linked_entries.unwrap_or(self.linked_entries),
            limits: Limits {
                max_depth: overlay.limits.max_depth.unwrap_or(self.limits.max_depth),
                max_customize_categories: overlay
                    .limits
                    .max_customize_categories
                    .unwrap_or(self.limits.max_customize_categories),
                max_using_categories: overlay
                    .limits
                    .max_using_categories
                    .unwrap_or(self.limits.max_using_categories),
            },
            actor: Actor {
                uid: overlay
                    .actor
                    .uid
                    .clone()
                    .unwrap_or_else(|| self.actor.uid.clone()),
                name: overlay
                    .actor
                    .name
                    .clone()
                    .unwrap_or_else(|| self.actor.name.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.catree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths()?;
        current.validate()?;

        Ok(current)
    }

    /// Apply CATREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("CATREE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("store_path") {
            settings.store_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("extended_scope") {
            settings.extended_scope = val;
        }
        if let Ok(val) = config.get::<u64>("linked_entries") {
            settings.linked_entries = val;
        }
        if let Ok(val) = config.get::<usize>("limits.max_depth") {
            settings.limits.max_depth = val;
        }
        if let Ok(val) = config.get::<usize>("limits.max_customize_categories") {
            settings.limits.max_customize_categories = val;
        }
        if let Ok(val) = config.get::<usize>("limits.max_using_categories") {
            settings.limits.max_using_categories = val;
        }
        if let Ok(val) = config.get_string("actor.uid") {
            settings.actor.uid = val;
        }
        if let Ok(val) = config.get_string("actor.name") {
            settings.actor.name = val;
        }

        Ok(settings)
    }

    /// Every new category starts with the module skeleton, so trees must fit it.
    fn validate(&self) -> Result<(), ApplicationError> {
        let min_depth = ModuleCatalog::standard().skeleton_depth();
        if self.limits.max_depth < min_depth {
            return Err(ApplicationError::Config {
                message: format!(
                    "limits.max_depth must be at least {} (got {})",
                    min_depth, self.limits.max_depth
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# catree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/catree/catree.toml
#   Local:  <dir>/.catree.toml
#   Env:    CATREE_* environment variables (nested keys use "__", e.g. CATREE_LIMITS__MAX_DEPTH)

# JSON snapshot holding all categories, nodes and module settings
# store_path = "~/.local/share/catree/catree.json"

# Enable the info resource catalog module
# extended_scope = false

# Entries linked to the information system category (gates its activation)
# linked_entries = 0

[limits]
# Levels from root to leaf, counting the root (at least 3, the module skeleton)
# max_depth = 5
# max_customize_categories = 20
# max_using_categories = 10

[actor]
# uid = "admin"
# name = "Administrator"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
