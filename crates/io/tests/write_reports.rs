use std::fs;

use skuflow_io::{load, write, IoError};
use skuflow_recon::model::HighlightTag;
use skuflow_recon::{OutputSheet, Table};
use tempfile::tempdir;

fn sheet(name: &str, skus: &[&str]) -> OutputSheet {
    let rows = skus.iter().map(|s| vec![Some(s.to_string()), Some("No".into())]).collect();
    let table = Table::from_rows(["Material Bank SKU", "Primary Child"], rows).unwrap();
    OutputSheet::new(name, table)
}

#[test]
fn single_sheet_csv_uses_requested_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("family.csv");
    let written = write(&path, &[sheet("Family_Members", &["0101", "0102"])]).unwrap();
    assert_eq!(written, vec![path.clone()]);

    let back = load(&path).unwrap();
    assert_eq!(back.value(0, "Material Bank SKU"), Some("0101"));
    assert_eq!(back.len(), 2);
}

#[test]
fn multi_sheet_csv_writes_one_file_per_sheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("retire.csv");
    let written = write(
        &path,
        &[sheet("Final_Results", &["SKU1"]), sheet("ReassignPrimaryChild", &["SKU2"])],
    )
    .unwrap();

    assert_eq!(
        written,
        vec![
            dir.path().join("retire.Final_Results.csv"),
            dir.path().join("retire.ReassignPrimaryChild.csv"),
        ]
    );
    assert!(!path.exists());
    let content = fs::read_to_string(&written[1]).unwrap();
    assert_eq!(content, "Material Bank SKU,Primary Child\nSKU2,No\n");
}

#[test]
fn xlsx_report_round_trips_through_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("visibility.xlsx");
    let highlighted = sheet("Final Results", &["0102", "P100"]).highlight_where(
        "Primary Child",
        HighlightTag::PrimaryChild,
        |v| v == Some("Yes"),
    );
    write(&path, &[highlighted, sheet("Filtered Rows", &["0102"])]).unwrap();

    // load reads the first worksheet only
    let back = load(&path).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back.value(1, "Material Bank SKU"), Some("P100"));
}

#[test]
fn empty_sheet_list_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("none.xlsx");
    assert!(write(&path, &[]).unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.parquet");
    fs::write(&path, "x").unwrap();
    assert!(matches!(load(&path), Err(IoError::UnsupportedFormat { .. })));
}
