use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use crate::config::CatalogPaths;
use crate::query::QueryService;
use crate::tools::{CatalogTools, tool_descriptors};

#[derive(Debug, Clone, Args)]
pub struct ToolsArgs {
    /// Call the named tool instead of listing descriptors.
    #[arg(long, value_name = "NAME")]
    pub call: Option<String>,

    /// JSON arguments for `--call`.
    #[arg(long, value_name = "JSON", requires = "call")]
    pub arguments: Option<String>,
}

pub fn run(args: &ToolsArgs, paths: &CatalogPaths) -> Result<()> {
    let Some(name) = &args.call else {
        let encoded = serde_json::to_string_pretty(&tool_descriptors())
            .context("failed to encode tool descriptors")?;
        println!("{encoded}");
        return Ok(());
    };

    let arguments = match args.arguments.as_deref().map(str::trim) {
        None | Some("") => Value::Null,
        Some(raw) => serde_json::from_str(raw).context("tool arguments must be valid JSON")?,
    };
    let tools = CatalogTools::new(QueryService::new(&paths.store_path));
    println!("{}", tools.call(name, &arguments));

    Ok(())
}
