//! CLI argument definitions for `cdef`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use cdef_definition::settings::DEFAULT_SETTINGS_FILE;

#[derive(Parser)]
#[command(
    name = "cdef",
    version,
    about = "Resolve classification definitions into a validated model",
    long_about = "Resolve classification definitions into a validated model.\n\n\
                  Reads literal, table-backed, all-in-one and resource definitions,\n\
                  extracts table classifications from the database and resolves\n\
                  which classification is deployed on each column."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the classification model and list its classifications.
    Classifications(RunArgs),

    /// Resolve and print the column deployment map.
    Deployment(RunArgs),

    /// Show the classification deployed on one column.
    Lookup(LookupArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Settings file naming the definition sources.
    #[arg(long = "settings", value_name = "PATH", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// SQLite database to extract from (overrides the settings file).
    #[arg(long = "database", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Environment selecting resource directories (overrides settings and CDEF_ENV).
    #[arg(long = "env", value_name = "NAME")]
    pub environment: Option<String>,

    /// Keep documentation-only classifications.
    #[arg(long = "documentation")]
    pub documentation: bool,

    /// Print JSON instead of a table.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct LookupArgs {
    /// Table name.
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Column name.
    #[arg(value_name = "COLUMN")]
    pub column: String,

    /// Database type of the column, for type-qualified deployment keys.
    #[arg(long = "db-type", value_name = "TYPE")]
    pub db_type: Option<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
