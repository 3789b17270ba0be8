#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use bikecat::cli::app::{Cli, Command, RuntimeArgs};
use bikecat::cli::commands;
use bikecat::config::CatalogPaths;
use bikecat::models::CommandFailure;
use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 64;
const LOG_ENV_VAR: &str = "BIKECAT_LOG";

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };
    init_tracing(&cli.runtime.log_level);

    let command_name = command_name(&cli.command);
    tracing::info!("bikecat: starting `{command_name}`");

    match execute(cli) {
        Ok(()) => {
            tracing::info!("bikecat: completed `{command_name}` (exit_code={EXIT_SUCCESS})");
            EXIT_SUCCESS
        }
        Err(error) => {
            let exit_code = EXIT_RUNTIME_FAILURE;
            tracing::error!("bikecat: failed `{command_name}` (exit_code={exit_code})");
            if let Some(failure) = error.downcast_ref::<CommandFailure>() {
                println!("{failure}");
            } else {
                tracing::error!("{error:#}");
            }
            exit_code
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let paths = resolve_catalog_paths(&cli.runtime)?;
    match cli.command {
        Command::Init(args) => commands::init::run(&args, &paths),
        Command::Sql(args) => commands::sql::run(&args, &paths),
        Command::Schema(args) => commands::schema::run(&args, &paths),
        Command::Tools(args) => commands::tools::run(&args, &paths),
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(format!("bikecat={log_level}")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Init(_) => "init",
        Command::Sql(_) => "sql",
        Command::Schema(_) => "schema",
        Command::Tools(_) => "tools",
    }
}

fn resolve_catalog_paths(args: &RuntimeArgs) -> Result<CatalogPaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = match &args.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };

    bikecat::config::resolve_catalog_paths(
        &home_dir,
        &cwd,
        args.store.as_deref(),
        args.workbook.as_deref(),
    )
}
