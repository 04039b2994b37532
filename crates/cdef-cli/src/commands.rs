use anyhow::{Context, Result};
use tracing::{info, info_span};

use cdef_definition::Settings;
use cdef_model::SchemaModel;
use cdef_resolve::{
    ClassificationResolver, ConnectionFactory, NoDatabase, ResolvedClassifications,
    SqliteConnectionFactory,
};

use crate::cli::{LookupArgs, RunArgs};
use crate::summary::{LookupResult, print_classifications, print_deployment, print_lookup};

/// Settings from `--settings` with the command line overrides applied.
pub fn load_settings(args: &RunArgs) -> Result<Settings> {
    let mut settings = Settings::load(&args.settings)
        .with_context(|| format!("load settings {}", args.settings.display()))?;
    if let Some(database) = &args.database {
        settings.database = Some(database.clone());
    }
    settings.override_environment(args.environment.clone());
    if args.documentation {
        settings.documentation_run = true;
    }
    Ok(settings)
}

/// Build the model and resolve deployment for one run.
pub fn resolve(settings: &Settings) -> Result<ResolvedClassifications> {
    let span = info_span!(
        "resolve",
        environment = settings.environment.as_deref().unwrap_or("-")
    );
    let _guard = span.enter();

    let (factory, schema) = match &settings.database {
        Some(path) => {
            let factory = SqliteConnectionFactory::new(path);
            let schema = factory.introspect().context("read main schema")?;
            info!(tables = schema.tables().len(), "introspected main schema");
            (Box::new(factory) as Box<dyn ConnectionFactory>, schema)
        }
        None => {
            info!("no database configured, table classifications cannot be extracted");
            (Box::new(NoDatabase) as Box<dyn ConnectionFactory>, SchemaModel::default())
        }
    };

    let resolver =
        ClassificationResolver::from_settings(settings, factory).context("load definitions")?;
    resolver
        .finish(&schema)
        .context("resolve classifications")
}

pub fn run_classifications(args: &RunArgs) -> Result<()> {
    let resolved = resolve(&load_settings(args)?)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(resolved.model())?);
    } else {
        print_classifications(&resolved);
    }
    Ok(())
}

pub fn run_deployment(args: &RunArgs) -> Result<()> {
    let resolved = resolve(&load_settings(args)?)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(resolved.deployment())?);
    } else {
        print_deployment(&resolved);
    }
    Ok(())
}

/// Returns whether a classification is deployed on the column.
pub fn run_lookup(args: &LookupArgs) -> Result<bool> {
    let resolved = resolve(&load_settings(&args.run)?)?;
    let result = lookup(&resolved, args);
    let found = result.classification.is_some();
    if args.run.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_lookup(&result);
    }
    Ok(found)
}

pub fn lookup<'r>(resolved: &'r ResolvedClassifications, args: &LookupArgs) -> LookupResult<'r> {
    let name = resolved.classification_name_for_typed(
        &args.table,
        &args.column,
        args.db_type.as_deref(),
    );
    LookupResult {
        table: args.table.clone(),
        column: args.column.clone(),
        classification_name: name,
        classification: name.and_then(|name| resolved.get(name)),
    }
}
