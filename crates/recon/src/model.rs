use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::{DuplicateKey, IdentityDiff};
use crate::reconcile::ReconcileReport;
use crate::region::Region;
use crate::rules::ViolationReport;
use crate::schema::SchemaReport;
use crate::table::Table;

// ---------------------------------------------------------------------------
// Check outcomes
// ---------------------------------------------------------------------------

/// Result of one per-field check. `Missing` means the column was absent and
/// the check was skipped, which is distinct from a check that ran clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum CheckOutcome<T> {
    Missing,
    Ran(T),
}

impl<T> CheckOutcome<T> {
    pub fn ran(&self) -> Option<&T> {
        match self {
            Self::Missing => None,
            Self::Ran(result) => Some(result),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCheck<T> {
    pub field: String,
    pub outcome: CheckOutcome<T>,
}

// ---------------------------------------------------------------------------
// Output sheets
// ---------------------------------------------------------------------------

/// Why a cell is highlighted. Rendering is up to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightTag {
    /// The family's current primary child.
    PrimaryChild,
}

/// A named output table plus per-row highlight tags for highlighted columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSheet {
    pub name: String,
    pub table: Table,
    /// Column name → one optional tag per row of `table`.
    pub highlights: BTreeMap<String, Vec<Option<HighlightTag>>>,
}

impl OutputSheet {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
            highlights: BTreeMap::new(),
        }
    }

    /// Tag cells of `column` for which `pred` holds. No-op when the column is absent.
    pub fn highlight_where<F>(mut self, column: &str, tag: HighlightTag, pred: F) -> Self
    where
        F: Fn(Option<&str>) -> bool,
    {
        if !self.table.has_column(column) {
            return self;
        }
        let tags: Vec<Option<HighlightTag>> = (0..self.table.len())
            .map(|row| pred(self.table.value(row, column)).then_some(tag))
            .collect();
        self.highlights.insert(column.to_string(), tags);
        self
    }

    pub fn highlight(&self, row: usize, column: &str) -> Option<HighlightTag> {
        self.highlights.get(column)?.get(row).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Where a SKU record ends up after a maintenance request is committed.
/// Computed per output row; never persisted here. Rows no ticket matched stay
/// active and are not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuState {
    PendingChange,
    Retired,
    Reassigned,
    Visible,
}

impl SkuState {
    /// The committed state a pending record moves to, per workflow.
    pub fn commit(self, workflow: Workflow) -> SkuState {
        match (self, workflow) {
            (SkuState::PendingChange, Workflow::Retire) => SkuState::Retired,
            (SkuState::PendingChange, Workflow::PrimaryChild) => SkuState::Reassigned,
            (SkuState::PendingChange, Workflow::Visibility) => SkuState::Visible,
            (state, _) => state,
        }
    }
}

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Review,
    PrimaryChild,
    Retire,
    Visibility,
    Filter,
}

impl std::fmt::Display for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Review => write!(f, "review"),
            Self::PrimaryChild => write!(f, "primary_child"),
            Self::Retire => write!(f, "retire"),
            Self::Visibility => write!(f, "visibility"),
            Self::Filter => write!(f, "filter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMeta {
    pub workflow: Workflow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    pub match_key: String,
    pub engine_version: String,
}

impl RunMeta {
    pub fn new(workflow: Workflow, region: Option<Region>, match_key: &str) -> Self {
        Self {
            workflow,
            region,
            match_key: match_key.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Review results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub import: Vec<DuplicateKey>,
    pub sku_list: Vec<DuplicateKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub import_rows: usize,
    pub sku_list_rows: usize,
    pub joined_rows: usize,
    pub missing_attributes: usize,
    pub missing_in_import: usize,
    pub extra_in_import: usize,
    pub duplicate_keys: usize,
    pub field_mismatches: usize,
    pub expected_violations: usize,
    pub empty_values: usize,
    pub pattern_violations: usize,
    pub primary_child_gaps: usize,
    /// Checks that did not run, as "check: field".
    pub skipped: Vec<String>,
}

impl ReviewSummary {
    pub fn has_discrepancies(&self) -> bool {
        self.missing_attributes
            + self.missing_in_import
            + self.extra_in_import
            + self.duplicate_keys
            + self.field_mismatches
            + self.expected_violations
            + self.empty_values
            + self.pattern_violations
            + self.primary_child_gaps
            > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewResult {
    pub meta: RunMeta,
    pub schema: SchemaReport,
    pub identity: IdentityDiff,
    pub duplicates: DuplicateReport,
    pub fields: ReconcileReport,
    pub expected: ViolationReport,
    pub non_empty: ViolationReport,
    pub patterns: ViolationReport,
    pub primary_child: ViolationReport,
    pub summary: ReviewSummary,
}

impl ReviewResult {
    pub fn has_discrepancies(&self) -> bool {
        self.summary.has_discrepancies()
    }

    /// One sheet per failing check: mismatch tables as-is, violations
    /// narrowed to the match key and the offending field.
    pub fn sheets(&self) -> Vec<OutputSheet> {
        let key = self.meta.match_key.as_str();
        let mut sheets: Vec<OutputSheet> = self
            .fields
            .mismatches()
            .map(|(field, m)| OutputSheet::new(format!("Mismatch {field}"), m.table.clone()))
            .collect();

        let groups = [
            ("Expected", &self.expected, true),
            ("Empty", &self.non_empty, true),
            ("Pattern", &self.patterns, true),
            ("Primary Child Gaps", &self.primary_child, false),
        ];
        for (label, report, per_field) in groups {
            for (field, v) in report.violations() {
                let name = if per_field {
                    format!("{label} {field}")
                } else {
                    label.to_string()
                };
                sheets.push(OutputSheet::new(name, v.offending.project(&[key, field])));
            }
        }
        sheets
    }
}

// ---------------------------------------------------------------------------
// Maintenance results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceSummary {
    /// Distinct requested identifiers.
    pub requested: usize,
    /// Export rows matching a requested identifier.
    pub matched_rows: usize,
    pub groups: usize,
    /// Rows of the first output sheet.
    pub output_rows: usize,
    /// Rows of the second output sheet, when there is one.
    pub secondary_rows: usize,
    pub reassignment_skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuTransition {
    pub sku: String,
    pub state: SkuState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceResult {
    pub meta: RunMeta,
    pub schema: SchemaReport,
    pub summary: MaintenanceSummary,
    pub transitions: Vec<SkuTransition>,
    pub sheets: Vec<OutputSheet>,
}

impl MaintenanceResult {
    pub fn sheet(&self, name: &str) -> Option<&OutputSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
