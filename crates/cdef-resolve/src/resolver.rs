//! Per-run owner of the classification model.
//!
//! A [`ClassificationResolver`] builds the model on first access and keeps
//! it. Deployment can be resolved (again) once a schema graph is available.
//! [`ClassificationResolver::finish`] freezes both into
//! [`ResolvedClassifications`], which is read-only and can be shared across
//! threads.

use serde::Serialize;
use tracing::info;

use cdef_definition::{
    ClassificationDefinitions, DeploymentDefinition, DirectoryPartialSource,
    DirectoryResourceFinder, ResourceDefinition, Settings, find_resource_definitions,
    load_classification_definitions, load_deployment_definition,
};
use cdef_model::{
    ClassificationModel, ClassificationTop, DeploymentMap, HandlingCompatibility, Result,
    SchemaModel, SqlDialect,
};

use crate::builder::{ModelBuilder, load_resource_definitions};
use crate::database::ConnectionFactory;
use crate::deployment::resolve_deployment;
use crate::handling::HandlingResolver;

/// Run options that shape the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverOptions {
    pub compatibility: HandlingCompatibility,
    pub dialect: SqlDialect,
    pub documentation_run: bool,
}

impl ResolverOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            compatibility: settings.compatibility,
            dialect: settings.dialect,
            documentation_run: settings.documentation_run,
        }
    }
}

pub struct ClassificationResolver {
    options: ResolverOptions,
    definitions: ClassificationDefinitions,
    resources: Vec<ResourceDefinition>,
    explicit_deployment: DeploymentDefinition,
    factory: Box<dyn ConnectionFactory>,
    model: Option<ClassificationModel>,
    deployment: Option<DeploymentMap>,
}

impl ClassificationResolver {
    pub fn new(
        options: ResolverOptions,
        definitions: ClassificationDefinitions,
        factory: Box<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            options,
            definitions,
            resources: Vec::new(),
            explicit_deployment: DeploymentDefinition::default(),
            factory,
            model: None,
            deployment: None,
        }
    }

    pub fn with_resources(mut self, resources: Vec<ResourceDefinition>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_explicit_deployment(mut self, explicit: DeploymentDefinition) -> Self {
        self.explicit_deployment = explicit;
        self
    }

    /// Load every definition source named by `settings`.
    pub fn from_settings(settings: &Settings, factory: Box<dyn ConnectionFactory>) -> Result<Self> {
        let partials = DirectoryPartialSource::new(settings.split_dir());
        let definitions = load_classification_definitions(
            &settings.definition_file,
            &settings.definition_name(),
            &partials,
        )?;
        let finder = DirectoryResourceFinder::new(&settings.resource_root);
        let resources = find_resource_definitions(&finder, settings.environment.as_deref())?;
        let explicit = load_deployment_definition(&settings.deployment_file)?;
        info!(
            classifications = definitions.classifications.len(),
            resource_files = resources.len(),
            environment = settings.environment.as_deref().unwrap_or("-"),
            "loaded classification definitions"
        );
        Ok(Self::new(ResolverOptions::from_settings(settings), definitions, factory)
            .with_resources(resources)
            .with_explicit_deployment(explicit))
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    pub fn handling(&self) -> HandlingResolver {
        HandlingResolver::new(self.options.compatibility)
    }

    /// The model, built on first call.
    pub fn model(&mut self) -> Result<&ClassificationModel> {
        let model = self.take_or_build_model()?;
        Ok(self.model.insert(model))
    }

    fn take_or_build_model(&mut self) -> Result<ClassificationModel> {
        match self.model.take() {
            Some(model) => Ok(model),
            None => self.build_model(),
        }
    }

    fn build_model(&self) -> Result<ClassificationModel> {
        let handling = self.handling();
        let resources = load_resource_definitions(&self.resources, handling)?;
        ModelBuilder::new(handling, &*self.factory)
            .dialect(self.options.dialect)
            .documentation_run(self.options.documentation_run)
            .build(&self.definitions, resources)
    }

    /// Resolve deployment against `schema`, replacing any earlier result.
    pub fn resolve_deployment(&mut self, schema: &SchemaModel) -> Result<&DeploymentMap> {
        let model = self.take_or_build_model()?;
        let deployment = resolve_deployment(&self.explicit_deployment, &model, schema);
        self.model = Some(model);
        Ok(self.deployment.insert(deployment))
    }

    pub fn deployment(&self) -> Option<&DeploymentMap> {
        self.deployment.as_ref()
    }

    /// Freeze the run. Deployment is resolved against `schema` unless it
    /// already was.
    pub fn finish(mut self, schema: &SchemaModel) -> Result<ResolvedClassifications> {
        let model = self.take_or_build_model()?;
        let deployment = match self.deployment.take() {
            Some(deployment) => deployment,
            None => resolve_deployment(&self.explicit_deployment, &model, schema),
        };
        Ok(ResolvedClassifications { model, deployment })
    }
}

impl std::fmt::Debug for ClassificationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationResolver")
            .field("options", &self.options)
            .field("classifications", &self.definitions.classifications.len())
            .field("built", &self.model.is_some())
            .field("deployed", &self.deployment.is_some())
            .finish()
    }
}

/// The frozen result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedClassifications {
    model: ClassificationModel,
    deployment: DeploymentMap,
}

impl ResolvedClassifications {
    pub fn model(&self) -> &ClassificationModel {
        &self.model
    }

    pub fn deployment(&self) -> &DeploymentMap {
        &self.deployment
    }

    pub fn get(&self, name: &str) -> Option<&ClassificationTop> {
        self.model.get(name)
    }

    pub fn classification_name_for(&self, table: &str, column: &str) -> Option<&str> {
        self.deployment.classification_name_for(table, column)
    }

    pub fn classification_name_for_typed(
        &self,
        table: &str,
        column: &str,
        db_type: Option<&str>,
    ) -> Option<&str> {
        self.deployment
            .classification_name_for_typed(table, column, db_type)
    }

    /// The classification deployed on a column, if it is still in the model.
    pub fn classification_for(&self, table: &str, column: &str) -> Option<&ClassificationTop> {
        self.classification_name_for(table, column)
            .and_then(|name| self.model.get(name))
    }
}
