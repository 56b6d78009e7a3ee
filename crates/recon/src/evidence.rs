use crate::model::{MaintenanceSummary, ReviewResult, ReviewSummary};
use crate::rules::ViolationReport;

/// Compute summary counts from the parts of a review.
pub fn review_summary(result: &ReviewResult, import_rows: usize, sku_list_rows: usize) -> ReviewSummary {
    let mut skipped: Vec<String> = result
        .fields
        .skipped()
        .map(|f| format!("comparison: {f}"))
        .collect();
    push_skipped(&mut skipped, "expected", &result.expected);
    push_skipped(&mut skipped, "non_empty", &result.non_empty);
    push_skipped(&mut skipped, "pattern", &result.patterns);
    push_skipped(&mut skipped, "primary_child", &result.primary_child);

    ReviewSummary {
        import_rows,
        sku_list_rows,
        joined_rows: result.fields.joined_rows,
        missing_attributes: result.schema.missing.len(),
        missing_in_import: result.identity.missing_in_a.len(),
        extra_in_import: result.identity.extra_in_a.len(),
        duplicate_keys: result.duplicates.import.len() + result.duplicates.sku_list.len(),
        field_mismatches: result.fields.mismatch_count(),
        expected_violations: result.expected.violation_count(),
        empty_values: result.non_empty.violation_count(),
        pattern_violations: result.patterns.violation_count(),
        primary_child_gaps: result.primary_child.violation_count(),
        skipped,
    }
}

fn push_skipped(out: &mut Vec<String>, check: &str, report: &ViolationReport) {
    out.extend(report.skipped().map(|f| format!("{check}: {f}")));
}

/// Summary counts for a maintenance run.
pub fn maintenance_summary(
    requested: usize,
    matched_rows: usize,
    groups: usize,
    output_rows: usize,
    secondary_rows: usize,
) -> MaintenanceSummary {
    MaintenanceSummary {
        requested,
        matched_rows,
        groups,
        output_rows,
        secondary_rows,
        reassignment_skipped: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DuplicateReport, RunMeta, Workflow};
    use crate::reconcile::ReconcileReport;
    use crate::rules::non_empty;
    use crate::schema::SchemaReport;
    use crate::table::Table;

    #[test]
    fn summary_counts_and_skips() {
        let t = Table::from_rows(["Primary Child"], vec![vec![None], vec![Some("No".into())]]).unwrap();
        let mut result = ReviewResult {
            meta: RunMeta::new(Workflow::Review, None, "Manufacturer Sku"),
            schema: SchemaReport {
                present: false,
                missing: vec!["Batch Number".into()],
            },
            identity: Default::default(),
            duplicates: DuplicateReport::default(),
            fields: ReconcileReport::default(),
            expected: ViolationReport::default(),
            non_empty: non_empty(&t, &["Color Name"]),
            patterns: ViolationReport::default(),
            primary_child: non_empty(&t, &["Primary Child"]),
            summary: ReviewSummary::default(),
        };
        result.summary = review_summary(&result, 2, 0);
        assert_eq!(result.summary.missing_attributes, 1);
        assert_eq!(result.summary.primary_child_gaps, 1);
        assert_eq!(result.summary.skipped, vec!["non_empty: Color Name"]);
        assert!(result.has_discrepancies());
    }

    #[test]
    fn clean_summary_has_no_discrepancies() {
        let summary = ReviewSummary {
            import_rows: 3,
            sku_list_rows: 3,
            skipped: vec!["pattern: Batch Number".into()],
            ..Default::default()
        };
        assert!(!summary.has_discrepancies());
    }
}
