// Excel import (calamine) and report export (rust_xlsxwriter)

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use skuflow_recon::{Cell, OutputSheet};

use crate::error::IoError;
use crate::header_table;

/// Excel's sheet name limit.
const MAX_SHEET_NAME: usize = 31;
const MAX_COLUMN_WIDTH: usize = 30;
const HIGHLIGHT_FILL: u32 = 0xFFC7CE;

/// Import the first worksheet of a workbook (xlsx, xlsm, xls, xlsb, ods).
pub fn import(path: &Path) -> Result<skuflow_recon::Table, IoError> {
    let excel_error = |message: String| IoError::Excel {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| excel_error(e.to_string()))?;
    let Some(first) = workbook.sheet_names().first().cloned() else {
        return Err(excel_error("workbook contains no sheets".to_string()));
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| excel_error(format!("sheet '{first}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|cell| cell_text(cell).unwrap_or_default()).collect(),
        None => Vec::new(),
    };
    let data: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(cell_text).collect()).collect();

    log::debug!("{}: reading sheet '{}'", path.display(), first);
    header_table(path, headers, data)
}

/// Text form of a cell. Every value is kept as a string; empty cells are null.
fn cell_text(cell: &Data) -> Cell {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(n) => {
            // Integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{}", n))
            }
        }
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{:?}", e)),
        Data::DateTime(dt) => Some(format!("{}", dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Write every sheet to one workbook. All cells use the text format `@` so
/// identifiers keep their leading zeros; highlighted cells are filled.
pub fn export(sheets: &[OutputSheet], path: &Path) -> Result<(), IoError> {
    let xlsx_error = |source: XlsxError| IoError::Xlsx {
        path: path.to_path_buf(),
        source,
    };

    let text = Format::new().set_num_format("@");
    let highlight = Format::new().set_num_format("@").set_background_color(Color::RGB(HIGHLIGHT_FILL));

    let mut workbook = Workbook::new();
    let mut used_names: HashSet<String> = HashSet::new();

    for sheet in sheets {
        let name = unique_sheet_name(&sheet.name, &mut used_names);
        if name != sheet.name {
            log::debug!("sheet '{}' written as '{}'", sheet.name, name);
        }
        let worksheet = workbook.add_worksheet().set_name(&name).map_err(xlsx_error)?;
        write_sheet(worksheet, sheet, &text, &highlight).map_err(xlsx_error)?;
    }

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &OutputSheet, text: &Format, highlight: &Format) -> Result<(), XlsxError> {
    let table = &sheet.table;
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();

    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, text)?;
    }

    for row in 0..table.len() {
        for (col, name) in table.columns().iter().enumerate() {
            let format = if sheet.highlight(row, name).is_some() { highlight } else { text };
            let (r, c) = (row as u32 + 1, col as u16);
            match table.cell(row, col) {
                Some(value) => {
                    widths[col] = widths[col].max(value.chars().count());
                    worksheet.write_string_with_format(r, c, value, format)?;
                }
                None => {
                    worksheet.write_blank(r, c, format)?;
                }
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, (width + 2).min(MAX_COLUMN_WIDTH) as f64)?;
        worksheet.set_column_format(col as u16, text)?;
    }

    if table.width() > 0 {
        worksheet.autofilter(0, 0, table.len() as u32, (table.width() - 1) as u16)?;
    }
    Ok(())
}

/// Excel-safe sheet name: forbidden characters replaced, at most 31 characters,
/// unique within the workbook (case-insensitive).
fn unique_sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let base = if cleaned.trim().is_empty() { "Sheet" } else { cleaned };

    let mut candidate = truncate(base, MAX_SHEET_NAME);
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        candidate = format!("{}{}", truncate(base, MAX_SHEET_NAME - suffix.len()), suffix);
        n += 1;
    }
    candidate
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
