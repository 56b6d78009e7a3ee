use std::collections::HashSet;

use serde::Serialize;

use crate::table::Table;

/// Outcome of a required-column check. Gaps are diagnostics, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub present: bool,
    pub missing: Vec<String>,
}

/// Report required columns absent from `table`, in `required` order.
/// Repeated names are reported once.
pub fn validate<S: AsRef<str>>(table: &Table, required: &[S]) -> SchemaReport {
    let mut seen = HashSet::new();
    let missing: Vec<String> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| seen.insert(*name))
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        log::debug!("schema check: {} of {} required column(s) missing", missing.len(), seen.len());
    }

    SchemaReport {
        present: missing.is_empty(),
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_missing_in_required_order() {
        let t = Table::new(["Family Id", "Material Bank SKU"]).unwrap();
        let report = validate(&t, &["Visibility", "Family Id", "Batch Number", "Visibility"]);
        assert!(!report.present);
        assert_eq!(report.missing, vec!["Visibility", "Batch Number"]);
    }

    #[test]
    fn all_present() {
        let t = Table::new(["A", "B"]).unwrap();
        let report = validate(&t, &["B", "A"]);
        assert!(report.present);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn idempotent() {
        let t = Table::new(["A"]).unwrap();
        let required = ["C", "A", "B"];
        assert_eq!(validate(&t, &required), validate(&t, &required));
    }
}
