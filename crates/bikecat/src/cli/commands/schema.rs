use anyhow::{Error, Result};
use clap::Args;
use serde_json::json;

use crate::config::CatalogPaths;
use crate::models::{CommandEnvelope, CommandFailure};
use crate::query::QueryService;

const COMMAND: &str = "catalog.schema";

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &SchemaArgs, paths: &CatalogPaths) -> Result<()> {
    let service = QueryService::new(&paths.store_path);
    if !args.json {
        println!("{}", service.describe());
        return Ok(());
    }

    match service.try_describe() {
        Ok(descriptor) => {
            let envelope = CommandEnvelope::ok(
                COMMAND,
                json!({
                    "table": descriptor.table,
                    "columns": descriptor.columns,
                    "sample_rows": descriptor.sample.json_rows(),
                    "text": descriptor.render(),
                }),
            )
            .with_meta("column_count", json!(descriptor.columns.len()))
            .with_meta("sample_row_count", json!(descriptor.sample.row_count()))
            .with_meta("store_path", json!(paths.store_path.display().to_string()));
            println!("{}", envelope.encode());
            Ok(())
        }
        Err(error) => {
            let envelope =
                CommandEnvelope::error(COMMAND, "schema_unavailable", format!("{error:#}"))
                    .with_meta("store_path", json!(paths.store_path.display().to_string()));
            Err(Error::new(CommandFailure::new(envelope)))
        }
    }
}
