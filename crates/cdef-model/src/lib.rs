#![deny(unsafe_code)]

pub mod classification;
pub mod deployment;
pub mod dialect;
pub mod error;
pub mod handling;
pub mod hint;
pub mod lookup;
pub mod schema;

pub use classification::{
    ClassificationElement, ClassificationModel, ClassificationOrigin, ClassificationTop,
    GroupingDefinition, TableSource,
};
pub use deployment::{ColumnAssignments, DeploymentMap};
pub use dialect::SqlDialect;
pub use error::{ClassificationError, Result, SourceError};
pub use handling::{HandlingCompatibility, UndefinedHandlingType};
pub use hint::{HintCandidate, HintMatcher, SharedMatcher, WILDCARD, compile_hint, is_pattern_key};
pub use lookup::{FlexibleMap, fold_key};
pub use schema::{Column, ForeignKey, SchemaModel, Table};
