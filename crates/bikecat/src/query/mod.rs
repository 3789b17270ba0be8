//! Query service: runs caller-supplied SQL against the catalog store and
//! describes the catalog table. Every fault is flattened into text at this
//! boundary; callers always receive a displayable string.

pub mod guardrail;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::render::{ResultTable, render_markdown, render_result};
use crate::sqlite::{StoreAccess, open_store_connection, quote_identifier, sqlite_single_quoted};

pub use guardrail::{SqlGuardrailViolation, is_blank_sql, validate_read_only_sql};

pub const SQL_ERROR_PREFIX: &str = "SQL Error: ";
pub const SCHEMA_ERROR_PREFIX: &str = "Error retrieving schema: ";
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

const SCHEMA_HEADERS: [&str; 6] = ["cid", "name", "type", "notnull", "default_value", "pk"];

/// Whether `run` accepts any statement or only single read-only queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlPolicy {
    #[default]
    Unrestricted,
    ReadOnly,
}

impl SqlPolicy {
    const fn store_access(self) -> StoreAccess {
        match self {
            Self::Unrestricted => StoreAccess::ReadWrite,
            Self::ReadOnly => StoreAccess::ReadOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaColumn {
    pub cid: i64,
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key_position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub table: String,
    pub columns: Vec<SchemaColumn>,
    pub sample: ResultTable,
}

impl SchemaDescriptor {
    #[must_use]
    pub fn columns_table(&self) -> ResultTable {
        ResultTable {
            columns: SCHEMA_HEADERS.iter().map(ToString::to_string).collect(),
            rows: self
                .columns
                .iter()
                .map(|column| {
                    vec![
                        SqlValue::Integer(column.cid),
                        SqlValue::Text(column.name.clone()),
                        SqlValue::Text(column.declared_type.clone()),
                        SqlValue::Integer(i64::from(column.not_null)),
                        column
                            .default_value
                            .clone()
                            .map_or(SqlValue::Null, SqlValue::Text),
                        SqlValue::Integer(column.primary_key_position),
                    ]
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Schema for table `{}`:\n\n{}\n\nSample data:\n\n{}",
            self.table,
            render_markdown(&self.columns_table()),
            render_markdown(&self.sample)
        )
    }
}

#[derive(Debug, Clone)]
pub struct QueryService {
    store_path: PathBuf,
    config: QueryConfig,
}

impl QueryService {
    #[must_use]
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self::with_config(store_path, QueryConfig::default())
    }

    #[must_use]
    pub fn with_config(store_path: impl Into<PathBuf>, config: QueryConfig) -> Self {
        Self {
            store_path: store_path.into(),
            config,
        }
    }

    /// Runs `sql` and renders the result; faults come back as `SQL Error: ...`.
    #[must_use]
    pub fn run(&self, sql: &str) -> String {
        match self.try_run(sql) {
            Ok(table) => render_result(&table),
            Err(error) => {
                warn!(store = %self.store_path.display(), "catalog query failed: {error:#}");
                format!("{SQL_ERROR_PREFIX}{error:#}")
            }
        }
    }

    pub fn try_run(&self, sql: &str) -> Result<ResultTable> {
        if self.config.policy == SqlPolicy::ReadOnly {
            validate_read_only_sql(sql)?;
        }
        if is_blank_sql(sql) {
            bail!("SQL statement is empty");
        }

        let connection =
            open_store_connection(&self.store_path, self.config.policy.store_access())?;
        debug!(
            store = %self.store_path.display(),
            policy = ?self.config.policy,
            sql,
            "executing catalog statement"
        );
        execute_statement(&connection, sql)
    }

    /// Column metadata plus sample rows; faults come back as `Error retrieving schema: ...`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.try_describe() {
            Ok(descriptor) => descriptor.render(),
            Err(error) => {
                warn!(store = %self.store_path.display(), "catalog schema lookup failed: {error:#}");
                format!("{SCHEMA_ERROR_PREFIX}{error:#}")
            }
        }
    }

    pub fn try_describe(&self) -> Result<SchemaDescriptor> {
        let connection = open_store_connection(&self.store_path, StoreAccess::ReadOnly)?;
        let table = &self.config.table;
        debug!(store = %self.store_path.display(), table = %table, "describing catalog table");

        let columns = load_table_columns(&connection, table)?;
        let sample_sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_identifier(table),
            self.config.sample_rows
        );
        let sample = execute_statement(&connection, &sample_sql)?;

        Ok(SchemaDescriptor {
            table: table.clone(),
            columns,
            sample,
        })
    }
}

/// Executes one statement and buffers the whole result set. Statements that
/// return no columns still run to completion and yield an empty table.
fn execute_statement(connection: &Connection, sql: &str) -> Result<ResultTable> {
    let mut statement = connection.prepare(sql).context("failed to prepare query")?;
    let columns = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement.query([]).context("failed to execute query")?;
    let mut result_rows = Vec::new();
    while let Some(row) = rows.next().context("failed to fetch query row")? {
        let mut record = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            record.push(
                row.get::<usize, SqlValue>(index)
                    .context("failed to decode query column")?,
            );
        }
        result_rows.push(record);
    }

    Ok(ResultTable {
        columns,
        rows: result_rows,
    })
}

fn load_table_columns(connection: &Connection, table: &str) -> Result<Vec<SchemaColumn>> {
    let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(table));
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to prepare column introspection for `{table}`"))?;

    let column_rows = statement
        .query_map([], |row| {
            Ok(SchemaColumn {
                cid: row.get::<usize, i64>(0)?,
                name: row.get::<usize, String>(1)?,
                declared_type: row.get::<usize, String>(2)?,
                not_null: row.get::<usize, i64>(3)? != 0,
                default_value: row.get::<usize, Option<String>>(4)?,
                primary_key_position: row.get::<usize, i64>(5)?,
            })
        })
        .with_context(|| format!("failed to execute column introspection for `{table}`"))?;

    column_rows
        .map(|row| row.context("failed to decode schema column row"))
        .collect()
}
