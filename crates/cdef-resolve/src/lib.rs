//! Classification resolution.
//!
//! This crate turns validated definitions into a [`ClassificationModel`] and
//! a [`DeploymentMap`]:
//!
//! - [`database`]: connection traits, the SQLite backend and schema introspection
//! - [`extract`]: table and all-in-one extraction
//! - [`builder`]: model building and post-processing
//! - [`handling`]: undefined-code handling policy
//! - [`deployment`]: column deployment with foreign-key propagation
//! - [`resolver`]: the per-run owner and the frozen result
//!
//! # Example
//!
//! ```rust,ignore
//! use cdef_definition::Settings;
//! use cdef_resolve::{ClassificationResolver, SqliteConnectionFactory};
//!
//! let settings = Settings::load(Path::new("cdef.toml"))?;
//! let factory = SqliteConnectionFactory::new("app.db");
//! let schema = factory.introspect()?;
//! let resolved = ClassificationResolver::from_settings(&settings, Box::new(factory))?
//!     .finish(&schema)?;
//! assert_eq!(resolved.classification_name_for("ORDER_LINE", "STATUS_CODE"), Some("OrderStatus"));
//! ```
//!
//! [`ClassificationModel`]: cdef_model::ClassificationModel
//! [`DeploymentMap`]: cdef_model::DeploymentMap

#![deny(unsafe_code)]

pub mod builder;
pub mod database;
pub mod deployment;
pub mod extract;
pub mod handling;
pub mod resolver;

pub use builder::{ModelBuilder, load_resource_definitions};
pub use database::{
    ConnectionFactory, LazyConnection, NoDatabase, SchemaConnection, SqlRow,
    SqliteConnectionFactory, introspect_sqlite_schema,
};
pub use deployment::resolve_deployment;
pub use extract::{AllInOneGroup, build_select, sanitize_element_name};
pub use handling::HandlingResolver;
pub use resolver::{ClassificationResolver, ResolvedClassifications, ResolverOptions};
