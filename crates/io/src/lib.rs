// Table loading and report writing

pub mod csv;
pub mod error;
pub mod xlsx;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use skuflow_recon::{Cell, OutputSheet, Table};

pub use error::IoError;

/// File formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Excel,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" | "txt" => Ok(FileFormat::Csv),
            "tsv" => Ok(FileFormat::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileFormat::Excel),
            _ => Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }
}

/// Load a table from a CSV/TSV/Excel file. The first row holds the headers.
pub fn load(path: &Path) -> Result<Table, IoError> {
    let table = match FileFormat::from_path(path)? {
        FileFormat::Csv => csv::import(path)?,
        FileFormat::Tsv => csv::import_tsv(path)?,
        FileFormat::Excel => xlsx::import(path)?,
    };
    log::debug!(
        "loaded {}: {} rows x {} columns",
        path.display(),
        table.len(),
        table.width()
    );
    Ok(table)
}

/// Write output sheets to `path` and return the files produced.
///
/// Excel targets get one worksheet per sheet. CSV/TSV targets get one file per
/// sheet, named `<stem>.<sheet>.<ext>` when there is more than one sheet.
pub fn write(path: &Path, sheets: &[OutputSheet]) -> Result<Vec<PathBuf>, IoError> {
    let format = FileFormat::from_path(path)?;
    if sheets.is_empty() {
        log::warn!("no output sheets to write to {}", path.display());
        return Ok(Vec::new());
    }

    let written = match format {
        FileFormat::Excel => {
            xlsx::export(sheets, path)?;
            vec![path.to_path_buf()]
        }
        FileFormat::Csv | FileFormat::Tsv => {
            let mut written = Vec::with_capacity(sheets.len());
            for sheet in sheets {
                let target = if sheets.len() == 1 {
                    path.to_path_buf()
                } else {
                    csv::sheet_path(path, &sheet.name)
                };
                if format == FileFormat::Tsv {
                    csv::export_tsv(&sheet.table, &target)?;
                } else {
                    csv::export(&sheet.table, &target)?;
                }
                written.push(target);
            }
            written
        }
    };
    log::info!("wrote {} file(s) for {} sheet(s)", written.len(), sheets.len());
    Ok(written)
}

/// Build a table from a raw header row and data rows.
///
/// Blank headers become `column_<n>` (1-based), repeated headers get `.1`, `.2`
/// suffixes, and rows are padded with nulls to the header width.
pub(crate) fn header_table(path: &Path, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Table, IoError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());
    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("column_{}", idx + 1)
        } else {
            header
        };
        let mut name = base.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{base}.{n}");
            n += 1;
        }
        if name != base {
            log::warn!("{}: duplicate header '{}' renamed to '{}'", path.display(), base, name);
        }
        columns.push(name);
    }

    let width = columns.len();
    let rows = rows
        .into_iter()
        .map(|mut row| {
            if row.len() < width {
                row.resize(width, None);
            }
            row
        })
        .collect();

    Table::from_rows(columns, rows).map_err(|source| IoError::Table {
        path: path.to_path_buf(),
        source,
    })
}
