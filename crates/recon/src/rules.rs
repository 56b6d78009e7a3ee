use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{CheckOutcome, FieldCheck};
use crate::table::{normalize, Table};

/// Default grammar for batch codes: "Batch 001" or "Batch 001-01".
pub const BATCH_NUMBER_PATTERN: &str = r"^Batch \d{3}(?:-\d{2})?$";

// ---------------------------------------------------------------------------
// Rule definitions
// ---------------------------------------------------------------------------

/// Field must equal a literal exactly (case-sensitive, untrimmed).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExpectedValue {
    pub field: String,
    pub value: String,
}

impl ExpectedValue {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Pattern rule as written in a region file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternSpec {
    pub field: String,
    pub pattern: String,
    #[serde(default)]
    pub example: String,
}

/// Compiled pattern rule. The regex must match the whole trimmed value.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub field: String,
    pub pattern: String,
    pub example: String,
    regex: Regex,
}

impl PatternRule {
    pub fn compile(spec: &PatternSpec) -> Result<Self, ConfigError> {
        let anchored = format!("^(?:{})$", spec.pattern);
        let regex = Regex::new(&anchored).map_err(|e| ConfigError::InvalidPattern {
            field: spec.field.clone(),
            pattern: spec.pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            field: spec.field.clone(),
            pattern: spec.pattern.clone(),
            example: spec.example.clone(),
            regex,
        })
    }

    pub fn is_match(&self, value: Option<&str>) -> bool {
        match value {
            None => false,
            Some(v) => self.regex.is_match(v.trim()),
        }
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// What a field was checked against, carried with its violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleMeta {
    NonEmpty,
    Expected { value: String },
    Pattern { pattern: String, example: String },
}

/// Offending rows of one field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violations {
    pub rule: RuleMeta,
    /// Source row indices, in table order.
    pub rows: Vec<usize>,
    /// The offending rows, all columns.
    pub offending: Table,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Ordered per-field results of one check call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationReport {
    pub checks: Vec<FieldCheck<Violations>>,
}

impl ViolationReport {
    pub fn get(&self, field: &str) -> Option<&CheckOutcome<Violations>> {
        self.checks.iter().find(|c| c.field == field).map(|c| &c.outcome)
    }

    /// Fields that ran and have at least one offending row.
    pub fn violations(&self) -> impl Iterator<Item = (&str, &Violations)> {
        self.checks.iter().filter_map(|c| match &c.outcome {
            CheckOutcome::Ran(v) if !v.is_empty() => Some((c.field.as_str(), v)),
            _ => None,
        })
    }

    /// Fields skipped because the column is absent.
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.checks
            .iter()
            .filter(|c| c.outcome.is_missing())
            .map(|c| c.field.as_str())
    }

    pub fn violation_count(&self) -> usize {
        self.violations().map(|(_, v)| v.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.violations().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

fn check_field<F>(table: &Table, field: &str, rule: RuleMeta, is_violation: F) -> FieldCheck<Violations>
where
    F: Fn(Option<&str>) -> bool,
{
    if !table.has_column(field) {
        log::debug!("value check on '{field}' skipped: column absent");
        return FieldCheck {
            field: field.to_string(),
            outcome: CheckOutcome::Missing,
        };
    }
    let rows = table.matching_rows(|r| is_violation(r.get(field)));
    let offending = table.select_rows(&rows);
    FieldCheck {
        field: field.to_string(),
        outcome: CheckOutcome::Ran(Violations { rule, rows, offending }),
    }
}

/// Null or whitespace-only cells violate.
pub fn non_empty<S: AsRef<str>>(table: &Table, fields: &[S]) -> ViolationReport {
    let checks = fields
        .iter()
        .map(|f| check_field(table, f.as_ref(), RuleMeta::NonEmpty, |v| normalize(v).is_empty()))
        .collect();
    ViolationReport { checks }
}

/// Cells whose string form differs from the literal violate. Null violates.
pub fn expected_values(table: &Table, rules: &[ExpectedValue]) -> ViolationReport {
    let checks = rules
        .iter()
        .map(|rule| {
            let meta = RuleMeta::Expected {
                value: rule.value.clone(),
            };
            check_field(table, &rule.field, meta, |v| v != Some(rule.value.as_str()))
        })
        .collect();
    ViolationReport { checks }
}

/// Cells whose trimmed value does not fully match the pattern violate. Null violates.
pub fn pattern_match(table: &Table, rules: &[PatternRule]) -> ViolationReport {
    let checks = rules
        .iter()
        .map(|rule| {
            let meta = RuleMeta::Pattern {
                pattern: rule.pattern.clone(),
                example: rule.example.clone(),
            };
            check_field(table, &rule.field, meta, |v| !rule.is_match(v))
        })
        .collect();
    ViolationReport { checks }
}
