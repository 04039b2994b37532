//! Classification definition loading.
//!
//! This crate turns user-authored TOML into validated definitions:
//!
//! - [`raw`]: the generic definition tree parsed from TOML
//! - [`definition`]: typed classification and deployment definitions
//! - [`split`]: merging of split partial files
//! - [`resource`]: resource-file discovery with environment scoping
//! - [`settings`]: the `cdef.toml` run settings
//!
//! # Directory Structure
//!
//! ```text
//! project/
//! ├── cdef.toml
//! ├── dfprop/
//! │   ├── classificationDefinitionMap.toml
//! │   ├── classificationDefinitionMap_order.toml   # split partial
//! │   └── classificationDeploymentMap.toml
//! └── resources/classification/
//!     ├── integration/                             # environment-specific
//!     │   └── region.toml
//!     └── region.toml
//! ```

#![deny(unsafe_code)]

pub mod definition;
pub mod raw;
pub mod resource;
pub mod settings;
pub mod split;

pub use definition::{
    ClassificationDefinitions, DeploymentDefinition, EntryShape, HandlingHints,
    LITERAL_SQL_PREFIX, LiteralDefinition, SPLIT_KEY, SQL_KEY, TableSourceDefinition,
    TopMetaDefinition,
};
pub use raw::{RawMap, RawNode, load_definition_file, parse_definition_str};
pub use resource::{
    CLASSIFICATION_RESOURCE, DirectoryResourceFinder, ResourceDefinition, ResourceFinder,
    find_resource_definitions,
};
pub use settings::{ENVIRONMENT_VAR, Settings};
pub use split::{DirectoryPartialSource, PartialSource, resolve_split};

use std::path::Path;

use cdef_model::Result;

/// Load a definition file and resolve its split partials.
pub fn load_classification_definitions(
    path: &Path,
    name: &str,
    partials: &dyn PartialSource,
) -> Result<ClassificationDefinitions> {
    let raw = load_definition_file(path)?;
    let merged = resolve_split(name, raw, partials)?;
    ClassificationDefinitions::from_raw(&merged)
}

/// Load the explicit deployment map; a missing file means no explicit entries.
pub fn load_deployment_definition(path: &Path) -> Result<DeploymentDefinition> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no deployment definition file");
        return Ok(DeploymentDefinition::default());
    }
    DeploymentDefinition::from_raw(&load_definition_file(path)?)
}
