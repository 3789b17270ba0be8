//! Callable actions offered to the external agent runtime.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::query::QueryService;

pub const EXECUTE_SQL: &str = "execute_sql";
pub const GET_SCHEMA_INFO: &str = "get_schema_info";

const EXECUTE_SQL_DESCRIPTION: &str = "Execute a SQL query against the bike catalog database.";
const GET_SCHEMA_INFO_DESCRIPTION: &str = "Get schema and sample data to help build SQL queries.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExecuteSqlInput {
    /// SQLite statement to run against the `catalog` table.
    pub sql_query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetSchemaInfoInput {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[must_use]
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: GET_SCHEMA_INFO,
            description: GET_SCHEMA_INFO_DESCRIPTION,
            input_schema: input_schema::<GetSchemaInfoInput>(),
        },
        ToolDescriptor {
            name: EXECUTE_SQL,
            description: EXECUTE_SQL_DESCRIPTION,
            input_schema: input_schema::<ExecuteSqlInput>(),
        },
    ]
}

fn input_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated tool input schema: {error}");
        }
    }
}

/// Binds the tool names to a [`QueryService`]. Every call returns display text.
#[derive(Debug, Clone)]
pub struct CatalogTools {
    service: QueryService,
}

impl CatalogTools {
    #[must_use]
    pub fn new(service: QueryService) -> Self {
        Self { service }
    }

    #[must_use]
    pub fn execute_sql(&self, sql_query: &str) -> String {
        self.service.run(sql_query)
    }

    #[must_use]
    pub fn get_schema_info(&self) -> String {
        self.service.describe()
    }

    /// Dispatches a tool call by name. `Null` arguments count as `{}`.
    #[must_use]
    pub fn call(&self, name: &str, arguments: &Value) -> String {
        debug!(tool = name, "dispatching catalog tool call");
        match name {
            EXECUTE_SQL => match ExecuteSqlInput::deserialize(arguments) {
                Ok(input) => self.execute_sql(&input.sql_query),
                Err(error) => invalid_arguments(name, &error),
            },
            GET_SCHEMA_INFO => match arguments {
                Value::Null => self.get_schema_info(),
                arguments => match GetSchemaInfoInput::deserialize(arguments) {
                    Ok(_) => self.get_schema_info(),
                    Err(error) => invalid_arguments(name, &error),
                },
            },
            other => {
                warn!(tool = other, "unknown catalog tool requested");
                format!("Unknown tool `{other}`; available tools: {GET_SCHEMA_INFO}, {EXECUTE_SQL}")
            }
        }
    }
}

fn invalid_arguments(name: &str, error: &serde_json::Error) -> String {
    warn!(tool = name, "invalid tool arguments: {error}");
    format!("Invalid arguments for `{name}`: {error}")
}
