//! `skuflow review`: new-SKU import review.

use std::path::Path;

use skuflow_recon::{review, ReviewResult};

use crate::exit_codes::EXIT_DISCREPANCIES;
use crate::{emit_json, load_table, resolve_region, write_sheets, CliError, GlobalOpts};

pub fn cmd_review(opts: &GlobalOpts, import: &Path, sku_list: &Path, match_key: Option<&str>) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    let import_table = load_table(import)?;
    let sku_list_table = load_table(sku_list)?;

    let result = review(&config, &import_table, &sku_list_table, match_key)?;

    emit_json(opts, &result)?;
    print_summary(&result);
    write_sheets(opts, &result.sheets())?;

    if result.has_discrepancies() {
        // Message already printed in the summary
        return Err(CliError::new(EXIT_DISCREPANCIES, ""));
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReviewResult) {
    let s = &result.summary;
    eprintln!(
        "review ({}, key '{}'): {} import row(s), {} SKU list row(s), {} joined",
        result.meta.region.map(|r| r.to_string()).unwrap_or_else(|| "custom".into()),
        result.meta.match_key,
        s.import_rows,
        s.sku_list_rows,
        s.joined_rows,
    );
    line("missing attributes", s.missing_attributes, &result.schema.missing);

    let missing: Vec<String> = result.identity.missing_in_a.iter().cloned().collect();
    line("SKUs missing from import", s.missing_in_import, &missing);
    let extra: Vec<String> = result.identity.extra_in_a.iter().cloned().collect();
    line("SKUs not requested", s.extra_in_import, &extra);

    let dups: Vec<String> = result
        .duplicates
        .import
        .iter()
        .chain(&result.duplicates.sku_list)
        .map(|d| format!("{} x{}", d.key, d.count))
        .collect();
    line("duplicate keys", s.duplicate_keys, &dups);

    let mismatched: Vec<String> = result.fields.mismatches().map(|(field, m)| format!("{field} ({})", m.table.len())).collect();
    line("field mismatches", s.field_mismatches, &mismatched);
    eprintln!("  expected-value violations: {}", s.expected_violations);
    eprintln!("  empty values: {}", s.empty_values);
    eprintln!("  pattern violations: {}", s.pattern_violations);
    eprintln!("  rows without primary child: {}", s.primary_child_gaps);

    if !s.skipped.is_empty() {
        eprintln!("  skipped (column absent): {}", s.skipped.join(", "));
    }
    if result.has_discrepancies() {
        eprintln!("discrepancies found");
    } else {
        eprintln!("import matches the SKU list");
    }
}

fn line(label: &str, count: usize, items: &[String]) {
    const SHOWN: usize = 10;
    if count == 0 {
        eprintln!("  {label}: 0");
        return;
    }
    let mut shown = items.iter().take(SHOWN).cloned().collect::<Vec<_>>().join(", ");
    if items.len() > SHOWN {
        shown.push_str(&format!(", ... ({} more)", items.len() - SHOWN));
    }
    eprintln!("  {label}: {count} [{shown}]");
}
