use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

use crate::query::{DEFAULT_SAMPLE_ROWS, SqlPolicy};
use crate::sqlite::CATALOG_TABLE;

pub const DEFAULT_STORE_FILE: &str = "bike_catalog.db";
pub const DEFAULT_WORKBOOK_FILE: &str = "catalog-bike.xlsx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub cwd: PathBuf,
    pub store_path: PathBuf,
    pub workbook_path: PathBuf,
}

impl CatalogPaths {
    /// Default file names inside `dir`; handy for tests and embedding.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            cwd: dir.to_path_buf(),
            store_path: dir.join(DEFAULT_STORE_FILE),
            workbook_path: dir.join(DEFAULT_WORKBOOK_FILE),
        }
    }

    #[must_use]
    pub fn store_exists(&self) -> bool {
        self.store_path.exists()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub table: String,
    pub sample_rows: usize,
    pub policy: SqlPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            table: CATALOG_TABLE.to_string(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            policy: SqlPolicy::default(),
        }
    }
}

pub fn resolve_catalog_paths(
    home_dir: &Path,
    cwd: &Path,
    store_override: Option<&Path>,
    workbook_override: Option<&Path>,
) -> Result<CatalogPaths> {
    if !home_dir.is_absolute() {
        bail!("home_dir must be absolute: {}", home_dir.display());
    }
    if !cwd.is_absolute() {
        bail!("cwd must be absolute: {}", cwd.display());
    }

    let home_dir = normalize_lexical(home_dir);
    let cwd = normalize_lexical(cwd);
    let store_path = match store_override {
        Some(path) => resolve_user_path(path, &home_dir, &cwd)?,
        None => cwd.join(DEFAULT_STORE_FILE),
    };
    let workbook_path = match workbook_override {
        Some(path) => resolve_user_path(path, &home_dir, &cwd)?,
        None => cwd.join(DEFAULT_WORKBOOK_FILE),
    };

    Ok(CatalogPaths {
        cwd,
        store_path,
        workbook_path,
    })
}

fn resolve_user_path(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let expanded = expand_tilde(path, home_dir)?;
    let resolved = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };

    Ok(normalize_lexical(&resolved))
}

fn expand_tilde(path: &Path, home_dir: &Path) -> Result<PathBuf> {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => {
            let mut expanded = home_dir.to_path_buf();
            for component in components {
                expanded.push(component.as_os_str());
            }
            Ok(expanded)
        }
        Some(Component::Normal(first))
            if first
                .to_str()
                .is_some_and(|segment| segment.starts_with('~')) =>
        {
            bail!(
                "unsupported home expansion syntax (only `~` and `~/...` are supported): {}",
                path.display()
            )
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }

    normalized
}
