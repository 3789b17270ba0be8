#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod loader;
pub mod models;
pub mod query;
pub mod render;
pub mod sheet;
pub mod sqlite;
pub mod tools;
pub mod utils;

pub use cli::app::{Cli, Command};
pub use config::{CatalogPaths, QueryConfig};
pub use loader::{LoadOutcome, LoadPlan, initialize, initialize_if_absent};
pub use query::{QueryService, SqlPolicy};
pub use tools::CatalogTools;
