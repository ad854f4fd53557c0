//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/eaog/eaog.toml`
//! 3. Local config: `<project_dir>/.eaog.toml`
//! 4. Environment variables: `EAOG_*` prefix

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Unified configuration for the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base directory for stored documents (default: ~/.eaog)
    pub base_dir: PathBuf,
    /// Project whose documents are opened (documents live in base_dir/<project>)
    pub project: String,
    /// Directory with framework definitions (default: base_dir/frameworks)
    pub frameworks_dir: Option<PathBuf>,
    /// Accept brief-form JSON on import
    pub accept_brief: bool,
    /// Seconds a confirmation prompt waits before it is declined
    pub confirm_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: dirs_default_base_dir(),
            project: "default".to_string(),
            frameworks_dir: None,
            accept_brief: true,
            confirm_timeout_secs: DEFAULT_CONFIRM_TIMEOUT_SECS,
        }
    }
}

pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 30;

/// Raw settings for intermediate parsing; `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_dir: Option<PathBuf>,
    pub project: Option<String>,
    pub frameworks_dir: Option<PathBuf>,
    pub accept_brief: Option<bool>,
    pub confirm_timeout_secs: Option<u64>,
}

/// Get the default base directory (~/.eaog).
fn dirs_default_base_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".eaog"))
        .unwrap_or_else(|| PathBuf::from("~/.eaog"))
}

/// Get the XDG config directory for the editor.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "eaog").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("eaog.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".eaog.toml")
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

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl Settings {
    /// Directory holding the current project's documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.base_dir.join(&self.project)
    }

    /// Directory with framework definitions.
    pub fn frameworks_dir(&self) -> PathBuf {
        self.frameworks_dir
            .clone()
            .unwrap_or_else(|| self.base_dir.join("frameworks"))
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.base_dir = PathBuf::from(expand(&self.base_dir.to_string_lossy()));
        self.frameworks_dir = self
            .frameworks_dir
            .as_ref()
            .map(|dir| PathBuf::from(expand(&dir.to_string_lossy())));
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            base_dir: overlay
                .base_dir
                .clone()
                .unwrap_or_else(|| self.base_dir.clone()),
            project: overlay
                .project
                .clone()
                .unwrap_or_else(|| self.project.clone()),
            frameworks_dir: overlay
                .frameworks_dir
                .clone()
                .or_else(|| self.frameworks_dir.clone()),
            accept_brief: overlay.accept_brief.unwrap_or(self.accept_brief),
            confirm_timeout_secs: overlay
                .confirm_timeout_secs
                .unwrap_or(self.confirm_timeout_secs),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory for local config
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Load settings from an explicit global config path.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply EAOG_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder =
            Config::builder().add_source(Environment::with_prefix("EAOG").separator("__"));

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("base_dir") {
            settings.base_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("project") {
            settings.project = val;
        }
        if let Ok(val) = config.get_string("frameworks_dir") {
            settings.frameworks_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_bool("accept_brief") {
            settings.accept_brief = val;
        }
        if let Ok(val) = config.get_int("confirm_timeout_secs") {
            settings.confirm_timeout_secs = u64::try_from(val).map_err(|_| {
                ApplicationError::Config {
                    message: format!("confirm_timeout_secs must not be negative: {val}"),
                }
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# eaog configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/eaog/eaog.toml
#   Local:  <project_dir>/.eaog.toml
#   Env:    EAOG_* environment variables

# Base directory for stored documents (documents live in base_dir/<project>)
# base_dir = "~/.eaog"

# Project whose documents are opened
# project = "default"

# Directory with framework definitions (*.json), default base_dir/frameworks
# frameworks_dir = "~/.eaog/frameworks"

# Accept brief-form JSON on import
# accept_brief = true

# Seconds a confirmation prompt waits before it is declined
# confirm_timeout_secs = 30
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
