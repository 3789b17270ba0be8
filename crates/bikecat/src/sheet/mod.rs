use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::render::format_real;

/// Largest magnitude at which an integral float still maps exactly onto `i64`.
const MAX_EXACT_INTEGRAL_FLOAT: f64 = 9_007_199_254_740_992.0;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage class inferred for a workbook column. Advisory only: SQLite does not
/// enforce declared types and no constraint validation happens on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAffinity {
    Integer,
    Real,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnAffinity {
    #[must_use]
    pub const fn declared_type(self) -> &'static str {
        match self {
            Self::Integer | Self::Boolean => "INTEGER",
            Self::Real => "REAL",
            Self::Timestamp => "TIMESTAMP",
            Self::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Timestamp(String),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => format_real(*value),
            Self::Boolean(true) => "True".to_string(),
            Self::Boolean(false) => "False".to_string(),
            Self::Timestamp(value) | Self::Text(value) => value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetColumn {
    pub name: String,
    pub affinity: ColumnAffinity,
}

/// One worksheet held fully in memory: header-derived columns plus data rows,
/// every row exactly as wide as the header.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<SheetColumn>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    pub fn from_cells(
        sheet_name: impl Into<String>,
        header: &[CellValue],
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self> {
        let sheet_name = sheet_name.into();
        if header.iter().all(CellValue::is_empty) {
            bail!("sheet `{sheet_name}` has no header row");
        }

        let names = header_names(header);
        let width = names.len();
        let mut rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect::<Vec<_>>();
        while rows
            .last()
            .is_some_and(|row| row.iter().all(CellValue::is_empty))
        {
            rows.pop();
        }

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| SheetColumn {
                name,
                affinity: infer_affinity(rows.iter().map(|row| &row[index])),
            })
            .collect();

        Ok(Self {
            sheet_name,
            columns,
            rows,
        })
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Reads the named sheet, or the first sheet when `sheet_name` is `None`.
pub fn read_workbook(path: &Path, sheet_name: Option<&str>) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let sheet_name = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook has no sheets: {}", path.display()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet `{sheet_name}` from {}", path.display()))?;

    table_from_range(&sheet_name, &range)
}

fn table_from_range(sheet_name: &str, range: &Range<Data>) -> Result<SheetTable> {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>());
    let Some(header) = rows.next() else {
        bail!("sheet `{sheet_name}` is empty; expected a header row");
    };

    SheetTable::from_cells(sheet_name, &header, rows.collect())
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(value) => CellValue::Integer(*value),
        Data::Float(value) => integral_float(*value)
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Real(*value)),
        Data::Bool(value) => CellValue::Boolean(*value),
        Data::String(value) => CellValue::Text(value.clone()),
        Data::DateTime(value) if value.is_duration() => CellValue::Real(value.as_f64()),
        // as_datetime honours the workbook's 1900/1904 date system.
        Data::DateTime(value) => value
            .as_datetime()
            .map(|datetime| CellValue::Timestamp(datetime.format(TIMESTAMP_FORMAT).to_string()))
            .unwrap_or(CellValue::Real(value.as_f64())),
        Data::DateTimeIso(value) => CellValue::Timestamp(value.replacen('T', " ", 1)),
        Data::DurationIso(value) => CellValue::Text(value.clone()),
    }
}

fn integral_float(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGRAL_FLOAT)
        .then_some(value as i64)
}

/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ... suffixes.
fn header_names(header: &[CellValue]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, cell) in header.iter().enumerate() {
        let base = match cell.display_text().trim() {
            "" => format!("Unnamed: {index}"),
            text => text.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 1usize;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(candidate);
    }

    names
}

fn infer_affinity<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnAffinity {
    let mut inferred: Option<ColumnAffinity> = None;

    for cell in cells {
        let observed = match cell {
            CellValue::Empty => continue,
            CellValue::Text(text) if text.is_empty() => continue,
            CellValue::Integer(_) => ColumnAffinity::Integer,
            CellValue::Real(_) => ColumnAffinity::Real,
            CellValue::Boolean(_) => ColumnAffinity::Boolean,
            CellValue::Timestamp(_) => ColumnAffinity::Timestamp,
            CellValue::Text(_) => return ColumnAffinity::Text,
        };

        inferred = Some(match (inferred, observed) {
            (None, observed) => observed,
            (Some(current), observed) if current == observed => current,
            (Some(ColumnAffinity::Integer), ColumnAffinity::Real)
            | (Some(ColumnAffinity::Real), ColumnAffinity::Integer) => ColumnAffinity::Real,
            _ => return ColumnAffinity::Text,
        });
    }

    inferred.unwrap_or(ColumnAffinity::Text)
}
