use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, params_from_iter};

use crate::sheet::{CellValue, ColumnAffinity, SheetColumn, SheetTable};

pub const CATALOG_TABLE: &str = "catalog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAccess {
    ReadWrite,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteWriteStats {
    pub input_rows: usize,
    pub rows_written: usize,
}

/// Opens (creating if needed) the store for loading.
pub fn open_sqlite_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create sqlite parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

/// Opens an existing store for querying. Never creates the file.
pub fn open_store_connection(path: &Path, access: StoreAccess) -> Result<Connection> {
    if !path.is_file() {
        bail!("catalog store does not exist: {}", path.display());
    }

    let mode = match access {
        StoreAccess::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
        StoreAccess::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
    };
    Connection::open_with_flags(
        path,
        mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[must_use]
pub fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[must_use]
pub fn create_table_sql(table: &str, columns: &[SheetColumn]) -> String {
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(&column.name),
                column.affinity.declared_type()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({definitions})", quote_identifier(table))
}

fn build_insert_sql(table: &str, columns: &[SheetColumn]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

/// Drops `table` if present and recreates it from `sheet` in one transaction.
pub fn replace_table(
    connection: &mut Connection,
    table: &str,
    sheet: &SheetTable,
) -> Result<SqliteWriteStats> {
    let tx = connection
        .transaction()
        .context("failed to open sqlite transaction")?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)))
        .with_context(|| format!("failed to drop existing table `{table}`"))?;
    tx.execute_batch(&create_table_sql(table, &sheet.columns))
        .with_context(|| format!("failed to create table `{table}`"))?;

    let mut rows_written = 0usize;
    {
        let mut statement = tx
            .prepare(&build_insert_sql(table, &sheet.columns))
            .context("failed to prepare sqlite insert statement")?;

        for (index, row) in sheet.rows.iter().enumerate() {
            let values = row
                .iter()
                .zip(&sheet.columns)
                .map(|(cell, column)| cell_sql_value(cell, column.affinity));
            statement
                .execute(params_from_iter(values))
                // +2: one for the header, one for 1-based sheet rows
                .with_context(|| format!("failed to insert sheet row {}", index + 2))?;
            rows_written += 1;
        }
    }
    tx.commit()
        .context("failed to commit sqlite load transaction")?;

    Ok(SqliteWriteStats {
        input_rows: sheet.row_count(),
        rows_written,
    })
}

#[must_use]
pub fn cell_sql_value(cell: &CellValue, affinity: ColumnAffinity) -> SqlValue {
    match (affinity, cell) {
        (_, CellValue::Empty) => SqlValue::Null,
        (ColumnAffinity::Text, CellValue::Text(text)) if text.is_empty() => SqlValue::Null,
        (ColumnAffinity::Integer, CellValue::Integer(value)) => SqlValue::Integer(*value),
        (ColumnAffinity::Real, CellValue::Integer(value)) => SqlValue::Real(*value as f64),
        (ColumnAffinity::Real, CellValue::Real(value)) => SqlValue::Real(*value),
        (ColumnAffinity::Boolean, CellValue::Boolean(value)) => {
            SqlValue::Integer(i64::from(*value))
        }
        (ColumnAffinity::Timestamp, CellValue::Timestamp(value)) => SqlValue::Text(value.clone()),
        (_, cell) => SqlValue::Text(cell.display_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CATALOG_TABLE, cell_sql_value, create_table_sql, quote_identifier, replace_table,
    };
    use crate::sheet::{CellValue, ColumnAffinity, SheetTable};
    use rusqlite::Connection;
    use rusqlite::types::Value as SqlValue;

    fn sample_sheet(models: &[&str]) -> SheetTable {
        let rows = models
            .iter()
            .enumerate()
            .map(|(index, model)| {
                vec![
                    CellValue::Integer(index as i64 + 1),
                    CellValue::Text((*model).to_string()),
                ]
            })
            .collect();
        SheetTable::from_cells(
            "Sheet1",
            &[
                CellValue::Text("id".to_string()),
                CellValue::Text("model name".to_string()),
            ],
            rows,
        )
        .expect("sheet should build")
    }

    #[test]
    fn quotes_identifiers_with_embedded_quotes() {
        assert_eq!(quote_identifier("model name"), "\"model name\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn create_table_uses_declared_types_without_constraints() {
        let sheet = sample_sheet(&["Beat"]);
        assert_eq!(
            create_table_sql(CATALOG_TABLE, &sheet.columns),
            "CREATE TABLE \"catalog\" (\"id\" INTEGER, \"model name\" TEXT)"
        );
    }

    #[test]
    fn replace_table_overwrites_previous_rows() {
        let mut connection = Connection::open_in_memory().expect("in-memory sqlite should open");

        let first = replace_table(&mut connection, CATALOG_TABLE, &sample_sheet(&["a", "b", "c"]))
            .expect("first load should succeed");
        assert_eq!(first.rows_written, 3);

        let second = replace_table(&mut connection, CATALOG_TABLE, &sample_sheet(&["d", "e"]))
            .expect("second load should succeed");
        assert_eq!(second.rows_written, 2);

        let count = connection
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| {
                row.get::<usize, i64>(0)
            })
            .expect("count should succeed");
        assert_eq!(count, 2);
    }

    #[test]
    fn cell_values_follow_column_affinity() {
        assert_eq!(
            cell_sql_value(&CellValue::Integer(3), ColumnAffinity::Real),
            SqlValue::Real(3.0)
        );
        assert_eq!(
            cell_sql_value(&CellValue::Boolean(true), ColumnAffinity::Boolean),
            SqlValue::Integer(1)
        );
        assert_eq!(
            cell_sql_value(&CellValue::Integer(125), ColumnAffinity::Text),
            SqlValue::Text("125".to_string())
        );
        assert_eq!(
            cell_sql_value(&CellValue::Empty, ColumnAffinity::Integer),
            SqlValue::Null
        );
    }
}
