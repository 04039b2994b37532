//! Resource-file classifications.
//!
//! Resource files hold literal classifications maintained outside the main
//! definition map. They live under `<root>/classification/`, optionally in a
//! per-environment subdirectory that takes precedence over the base directory.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use cdef_model::{ClassificationError, Result};

use crate::definition::ClassificationDefinitions;
use crate::raw::load_definition_file;

/// Logical resource name of classification files.
pub const CLASSIFICATION_RESOURCE: &str = "classification";

/// Finds resource files by logical name.
pub trait ResourceFinder {
    /// Ordered resource files, scoped to `environment` when given.
    fn find(&self, resource: &str, environment: Option<&str>) -> Result<Vec<PathBuf>>;
}

/// Scans `<root>/<resource>/<environment>/` and falls back to
/// `<root>/<resource>/` when the environment directory has no files.
#[derive(Debug, Clone)]
pub struct DirectoryResourceFinder {
    root: PathBuf,
}

impl DirectoryResourceFinder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceFinder for DirectoryResourceFinder {
    fn find(&self, resource: &str, environment: Option<&str>) -> Result<Vec<PathBuf>> {
        let base = self.root.join(resource);
        if let Some(environment) = environment {
            let scoped = list_toml_files(&base.join(environment))?;
            if !scoped.is_empty() {
                return Ok(scoped);
            }
            debug!(environment, "no environment resources, using base directory");
        }
        list_toml_files(&base)
    }
}

fn list_toml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|error| ClassificationError::io(dir, error))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|error| ClassificationError::io(dir, error))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parsed definitions of one resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    pub path: PathBuf,
    pub definitions: ClassificationDefinitions,
}

/// Load every classification resource file visible to `environment`.
pub fn find_resource_definitions(
    finder: &dyn ResourceFinder,
    environment: Option<&str>,
) -> Result<Vec<ResourceDefinition>> {
    let files = finder.find(CLASSIFICATION_RESOURCE, environment)?;
    let mut resources = Vec::with_capacity(files.len());
    for path in files {
        let raw = load_definition_file(&path)?;
        let definitions = ClassificationDefinitions::from_raw(&raw)?;
        if definitions.all_in_one_sql.is_some() {
            return Err(ClassificationError::shape(
                path.display().to_string(),
                "literal classifications",
                "all-in-one SQL",
            ));
        }
        resources.push(ResourceDefinition { path, definitions });
    }
    info!(files = resources.len(), "loaded classification resources");
    Ok(resources)
}
