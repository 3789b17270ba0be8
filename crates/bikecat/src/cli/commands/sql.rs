use anyhow::{Error, Result};
use clap::Args;
use serde_json::json;

use crate::config::{CatalogPaths, QueryConfig};
use crate::models::{CommandEnvelope, CommandFailure};
use crate::query::{QueryService, SqlPolicy};
use crate::render::render_result;

const COMMAND: &str = "catalog.sql";

#[derive(Debug, Clone, Args)]
pub struct SqlArgs {
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Reject anything but a single SELECT and open the store read-only.
    #[arg(long, default_value_t = false)]
    pub read_only: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &SqlArgs, paths: &CatalogPaths) -> Result<()> {
    let policy = if args.read_only {
        SqlPolicy::ReadOnly
    } else {
        SqlPolicy::Unrestricted
    };
    let service = QueryService::with_config(
        &paths.store_path,
        QueryConfig {
            policy,
            ..QueryConfig::default()
        },
    );

    if !args.json {
        println!("{}", service.run(&args.sql));
        return Ok(());
    }

    let started = std::time::Instant::now();
    let result = service.try_run(&args.sql);
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(table) => {
            let envelope = CommandEnvelope::ok(
                COMMAND,
                json!({
                    "columns": table.columns,
                    "rows": table.json_rows(),
                    "text": render_result(&table),
                }),
            )
            .with_meta("row_count", json!(table.row_count()))
            .with_meta("duration_ms", json!(duration_ms))
            .with_meta("policy", json!(policy));
            println!("{}", envelope.encode());
            Ok(())
        }
        Err(error) => {
            let envelope =
                CommandEnvelope::error(COMMAND, "query_execution_failed", format!("{error:#}"))
                    .with_meta("duration_ms", json!(duration_ms))
                    .with_meta("policy", json!(policy));
            Err(Error::new(CommandFailure::new(envelope)))
        }
    }
}
