//! Run settings loaded from `cdef.toml`.
//!
//! ```toml
//! environment = "integration"
//! compatibility = "modern"
//! dialect = "standard"
//! definition_file = "dfprop/classificationDefinitionMap.toml"
//! deployment_file = "dfprop/classificationDeploymentMap.toml"
//! resource_root = "resources"
//! database = "app.db"
//! ```
//!
//! Every key is optional. Relative paths resolve against the directory of
//! the settings file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use cdef_model::{ClassificationError, HandlingCompatibility, Result, SqlDialect};

/// Environment variable that overrides [`Settings::environment`].
pub const ENVIRONMENT_VAR: &str = "CDEF_ENV";

pub const DEFAULT_SETTINGS_FILE: &str = "cdef.toml";
pub const DEFAULT_DEFINITION_FILE: &str = "classificationDefinitionMap.toml";
pub const DEFAULT_DEPLOYMENT_FILE: &str = "classificationDeploymentMap.toml";
pub const DEFAULT_RESOURCE_ROOT: &str = "resources";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Selects environment-specific resource directories.
    pub environment: Option<String>,
    /// Keep documentation-only classifications in the model.
    pub documentation_run: bool,
    pub compatibility: HandlingCompatibility,
    pub dialect: SqlDialect,
    pub definition_file: PathBuf,
    pub deployment_file: PathBuf,
    /// Directory of split partials; defaults to the definition file's directory.
    pub split_dir: Option<PathBuf>,
    pub resource_root: PathBuf,
    /// SQLite database holding the main schema.
    pub database: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: None,
            documentation_run: false,
            compatibility: HandlingCompatibility::default(),
            dialect: SqlDialect::default(),
            definition_file: PathBuf::from(DEFAULT_DEFINITION_FILE),
            deployment_file: PathBuf::from(DEFAULT_DEPLOYMENT_FILE),
            split_dir: None,
            resource_root: PathBuf::from(DEFAULT_RESOURCE_ROOT),
            database: None,
        }
    }
}

impl Settings {
    /// Load settings and apply the `CDEF_ENV` override.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::load_file(path)?;
        settings.override_environment(std::env::var(ENVIRONMENT_VAR).ok());
        Ok(settings)
    }

    /// Load settings without consulting the process environment.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|error| ClassificationError::io(path, error))?;
        let settings = Self::from_toml_str(&content, path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        info!(path = %path.display(), "loaded settings");
        Ok(settings.relative_to(base_dir))
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|error| ClassificationError::Parse {
            path: origin.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Replace the environment when `value` is a non-blank name.
    pub fn override_environment(&mut self, value: Option<String>) {
        if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
            self.environment = Some(value.trim().to_string());
        }
    }

    /// Resolve every relative path against `base_dir`.
    pub fn relative_to(mut self, base_dir: &Path) -> Self {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };
        self.definition_file = resolve(&self.definition_file);
        self.deployment_file = resolve(&self.deployment_file);
        self.resource_root = resolve(&self.resource_root);
        self.split_dir = self.split_dir.as_deref().map(resolve);
        self.database = self.database.as_deref().map(resolve);
        self
    }

    /// Base name of split partials: the definition file's stem.
    pub fn definition_name(&self) -> String {
        self.definition_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "classificationDefinitionMap".to_string())
    }

    pub fn split_dir(&self) -> PathBuf {
        match &self.split_dir {
            Some(dir) => dir.clone(),
            None => self
                .definition_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}
