use anyhow::{Error, Result, anyhow};
use clap::Args;
use serde_json::json;

use crate::config::CatalogPaths;
use crate::loader::{LoadOutcome, LoadPlan, initialize, initialize_if_absent};
use crate::models::{CommandEnvelope, CommandFailure};

const COMMAND: &str = "catalog.init";

#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Reload even when the store already exists.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Sheet to load instead of the first one.
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run(args: &InitArgs, paths: &CatalogPaths) -> Result<()> {
    let mut plan = LoadPlan::from_paths(paths);
    if let Some(sheet) = &args.sheet {
        plan = plan.with_sheet(sheet.clone());
    }

    let outcome = if args.force {
        Some(initialize(&plan))
    } else {
        initialize_if_absent(&plan)
    };

    let Some(outcome) = outcome else {
        let message = format!(
            "Store already exists at {}; skipping load (pass --force to reload)",
            plan.store_path.display()
        );
        if args.json {
            let envelope = CommandEnvelope::ok(COMMAND, json!({ "skipped": true, "message": message }))
                .with_meta("store_path", json!(plan.store_path.display().to_string()));
            println!("{}", envelope.encode());
        } else {
            println!("{message}");
        }
        return Ok(());
    };

    match (&outcome, args.json) {
        (LoadOutcome::Loaded(report), true) => {
            let envelope = CommandEnvelope::ok(
                COMMAND,
                json!({ "skipped": false, "message": outcome.message(), "report": report }),
            )
            .with_meta("store_path", json!(plan.store_path.display().to_string()))
            .with_meta(
                "workbook_path",
                json!(plan.workbook_path.display().to_string()),
            );
            println!("{}", envelope.encode());
            Ok(())
        }
        (LoadOutcome::Loaded(_), false) => {
            println!("{outcome}");
            Ok(())
        }
        (failed, true) => {
            let envelope = CommandEnvelope::error(COMMAND, failure_code(failed), failed.message())
                .with_meta(
                    "workbook_path",
                    json!(plan.workbook_path.display().to_string()),
                );
            Err(Error::new(CommandFailure::new(envelope)))
        }
        (failed, false) => Err(anyhow!("{failed}")),
    }
}

fn failure_code(outcome: &LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Loaded(_) => "ok",
        LoadOutcome::WorkbookMissing { .. } => "workbook_missing",
        LoadOutcome::Failed { .. } => "load_failed",
    }
}
