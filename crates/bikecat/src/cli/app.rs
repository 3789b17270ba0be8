use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{init::InitArgs, schema::SchemaArgs, sql::SqlArgs, tools::ToolsArgs};

#[derive(Debug, Parser)]
#[command(
    name = "bikecat",
    version,
    about = "SQL data layer for the motorcycle catalog assistant"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    /// SQLite store holding the `catalog` table.
    #[arg(long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Workbook the catalog is loaded from.
    #[arg(long, global = true, value_name = "PATH")]
    pub workbook: Option<PathBuf>,

    /// Log filter for stderr output; `BIKECAT_LOG` takes precedence.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the workbook into the store.
    Init(InitArgs),
    /// Run one SQL statement against the store.
    Sql(SqlArgs),
    /// Describe the catalog table with sample rows.
    Schema(SchemaArgs),
    /// List or call the agent-facing tools.
    Tools(ToolsArgs),
}
