use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CatalogPaths;
use crate::sheet::{SheetTable, read_workbook};
use crate::sqlite::{CATALOG_TABLE, SqliteWriteStats, open_sqlite_connection, replace_table};

pub const LOAD_SUCCESS_MESSAGE: &str = "Database initialized successfully!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub workbook_path: PathBuf,
    pub store_path: PathBuf,
    pub sheet_name: Option<String>,
    pub table_name: String,
}

impl LoadPlan {
    #[must_use]
    pub fn from_paths(paths: &CatalogPaths) -> Self {
        Self {
            workbook_path: paths.workbook_path.clone(),
            store_path: paths.store_path.clone(),
            sheet_name: None,
            table_name: CATALOG_TABLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub sheet_name: String,
    pub table_name: String,
    pub columns: Vec<String>,
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(LoadReport),
    WorkbookMissing { path: PathBuf },
    Failed { cause: String },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Loaded(_) => LOAD_SUCCESS_MESSAGE.to_string(),
            Self::WorkbookMissing { path } => {
                format!("Excel file not found at {}", path.display())
            }
            Self::Failed { cause } => format!("Failed to initialize database: {cause}"),
        }
    }
}

impl Display for LoadOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Reads the workbook and replaces the catalog table with its rows. A store
/// file created by a failed load is removed again.
pub fn load_catalog(plan: &LoadPlan) -> Result<LoadReport> {
    let sheet = read_workbook(&plan.workbook_path, plan.sheet_name.as_deref())?;
    let store_existed = plan.store_path.exists();

    let stats = match write_sheet(plan, &sheet) {
        Ok(stats) => stats,
        Err(error) => {
            if !store_existed {
                discard_store(&plan.store_path);
            }
            return Err(error);
        }
    };
    debug!(
        table = %plan.table_name,
        input_rows = stats.input_rows,
        rows_written = stats.rows_written,
        "catalog load transaction committed"
    );

    Ok(LoadReport {
        sheet_name: sheet.sheet_name,
        table_name: plan.table_name.clone(),
        columns: sheet.columns.into_iter().map(|column| column.name).collect(),
        rows_written: stats.rows_written,
    })
}

fn write_sheet(plan: &LoadPlan, sheet: &SheetTable) -> Result<SqliteWriteStats> {
    let mut connection = open_sqlite_connection(&plan.store_path)?;
    replace_table(&mut connection, &plan.table_name, sheet)
}

fn discard_store(store_path: &Path) {
    match std::fs::remove_file(store_path) {
        Ok(()) => debug!(store = %store_path.display(), "removed store left by failed load"),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            warn!(store = %store_path.display(), "failed to remove store left by failed load: {error}");
        }
    }
}

/// Never fails: a missing workbook or any load fault is reported in the outcome.
#[must_use]
pub fn initialize(plan: &LoadPlan) -> LoadOutcome {
    if !plan.workbook_path.is_file() {
        warn!(workbook = %plan.workbook_path.display(), "catalog workbook not found; skipping load");
        return LoadOutcome::WorkbookMissing {
            path: plan.workbook_path.clone(),
        };
    }

    match load_catalog(plan) {
        Ok(report) => {
            info!(
                workbook = %plan.workbook_path.display(),
                store = %plan.store_path.display(),
                sheet = %report.sheet_name,
                rows = report.rows_written,
                columns = report.columns.len(),
                "catalog table loaded"
            );
            LoadOutcome::Loaded(report)
        }
        Err(error) => {
            warn!(workbook = %plan.workbook_path.display(), "catalog load failed: {error:#}");
            LoadOutcome::Failed {
                cause: format!("{error:#}"),
            }
        }
    }
}

/// Runs [`initialize`] only when the store file does not exist yet.
#[must_use]
pub fn initialize_if_absent(plan: &LoadPlan) -> Option<LoadOutcome> {
    if plan.store_path.exists() {
        info!(store = %plan.store_path.display(), "catalog store present; skipping load");
        return None;
    }
    Some(initialize(plan))
}

#[cfg(test)]
mod tests {
    use super::{LOAD_SUCCESS_MESSAGE, LoadOutcome, LoadPlan, LoadReport, initialize};
    use crate::config::CatalogPaths;
    use std::path::{Path, PathBuf};

    #[test]
    fn outcome_messages_match_status_contract() {
        let loaded = LoadOutcome::Loaded(LoadReport {
            sheet_name: "Sheet1".to_string(),
            table_name: "catalog".to_string(),
            columns: vec!["id".to_string()],
            rows_written: 1,
        });
        assert_eq!(loaded.message(), LOAD_SUCCESS_MESSAGE);
        assert!(loaded.is_success());

        let missing = LoadOutcome::WorkbookMissing {
            path: PathBuf::from("/data/catalog-bike.xlsx"),
        };
        assert_eq!(
            missing.to_string(),
            "Excel file not found at /data/catalog-bike.xlsx"
        );
        assert!(!missing.is_success());
    }

    #[test]
    fn missing_workbook_leaves_store_untouched() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let plan = LoadPlan::from_paths(&CatalogPaths::in_dir(dir.path()));

        let outcome = initialize(&plan);
        assert!(matches!(outcome, LoadOutcome::WorkbookMissing { .. }));
        assert!(!plan.store_path.exists());
    }

    #[test]
    fn unreadable_workbook_is_reported_as_failure_text() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let paths = CatalogPaths::in_dir(dir.path());
        std::fs::write(&paths.workbook_path, b"not a workbook").expect("fixture should write");

        let outcome = initialize(&LoadPlan::from_paths(&paths));
        assert!(
            outcome
                .message()
                .starts_with("Failed to initialize database: "),
            "unexpected outcome: {outcome}"
        );
    }
}
