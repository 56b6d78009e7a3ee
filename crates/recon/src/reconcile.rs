//! Field-by-field comparison of two tables joined on a key.

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, TableRole};
use crate::identity::require_key;
use crate::model::{CheckOutcome, FieldCheck};
use crate::predicate::Condition;
use crate::table::{Cell, Table};

/// Which input a `skip_when` condition reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    A,
    B,
}

/// One field to compare, with the row conditions under which it is not authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComparisonRule {
    pub field: String,
    #[serde(default)]
    pub skip_when: Vec<Condition>,
    #[serde(default)]
    pub side: Side,
}

impl ComparisonRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            skip_when: Vec::new(),
            side: Side::A,
        }
    }

    pub fn skip_when(mut self, condition: Condition) -> Self {
        self.skip_when.push(condition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JoinSuffixes {
    pub a: String,
    pub b: String,
}

impl Default for JoinSuffixes {
    fn default() -> Self {
        Self {
            a: "_ImportFile".into(),
            b: "_SkuList".into(),
        }
    }
}

impl JoinSuffixes {
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
        }
    }
}

/// Rows of one field whose values differ across the two inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatches {
    /// Columns: key, field + suffix A, field + suffix B.
    pub table: Table,
    /// Number of joined rows excluded by `skip_when`.
    pub skipped_rows: usize,
}

impl Mismatches {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Rows in the joined table.
    pub joined_rows: usize,
    pub fields: Vec<FieldCheck<Mismatches>>,
}

impl ReconcileReport {
    pub fn get(&self, field: &str) -> Option<&CheckOutcome<Mismatches>> {
        self.fields.iter().find(|c| c.field == field).map(|c| &c.outcome)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = (&str, &Mismatches)> {
        self.fields.iter().filter_map(|c| match &c.outcome {
            CheckOutcome::Ran(m) if !m.is_empty() => Some((c.field.as_str(), m)),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|c| c.outcome.is_missing())
            .map(|c| c.field.as_str())
    }

    pub fn mismatch_count(&self) -> usize {
        self.mismatches().map(|(_, m)| m.len()).sum()
    }
}

/// Compare `rules` fields of `a` and `b` joined on `key`.
///
/// Values are compared as strings with null coerced to "" and no trimming.
/// A rule whose field is absent from either table, or is the key itself,
/// yields `Missing`.
pub fn reconcile(
    a: &Table,
    b: &Table,
    key: &str,
    rules: &[ComparisonRule],
    suffixes: &JoinSuffixes,
) -> Result<ReconcileReport, ReconError> {
    require_key(a, TableRole::Export, key)?;
    require_key(b, TableRole::Ticket, key)?;

    let joined = a.inner_join(b, key, (suffixes.a.as_str(), suffixes.b.as_str()))?;
    let mut fields = Vec::with_capacity(rules.len());

    for rule in rules {
        let field = rule.field.as_str();
        if field == key {
            log::debug!("comparison of '{field}' skipped: field is the join key");
            fields.push(FieldCheck {
                field: field.to_string(),
                outcome: CheckOutcome::Missing,
            });
            continue;
        }
        if !a.has_column(field) || !b.has_column(field) {
            log::debug!("comparison of '{field}' skipped: column absent");
            fields.push(FieldCheck {
                field: field.to_string(),
                outcome: CheckOutcome::Missing,
            });
            continue;
        }

        let col_a = format!("{field}{}", suffixes.a);
        let col_b = format!("{field}{}", suffixes.b);
        let skip_when = joined_conditions(rule, a, b, key, suffixes);
        let mut mismatches = Table::new([key.to_string(), col_a.clone(), col_b.clone()])?;
        let mut skipped_rows = 0;

        for row in joined.rows() {
            if skip_when.iter().any(|c| c.holds(row)) {
                skipped_rows += 1;
                continue;
            }
            let va = row.get(&col_a);
            let vb = row.get(&col_b);
            if va.unwrap_or("") != vb.unwrap_or("") {
                let out: Vec<Cell> = vec![
                    row.get(key).map(str::to_string),
                    va.map(str::to_string),
                    vb.map(str::to_string),
                ];
                mismatches.push_row(out)?;
            }
        }

        fields.push(FieldCheck {
            field: field.to_string(),
            outcome: CheckOutcome::Ran(Mismatches {
                table: mismatches,
                skipped_rows,
            }),
        });
    }

    Ok(ReconcileReport {
        joined_rows: joined.len(),
        fields,
    })
}

/// Rewrite `skip_when` onto the columns of the joined table.
///
/// A column shared by both inputs carries the side's suffix after the join.
/// Conditions on a column the side lacks are dropped, so they never exclude.
fn joined_conditions(rule: &ComparisonRule, a: &Table, b: &Table, key: &str, suffixes: &JoinSuffixes) -> Vec<Condition> {
    let (own, other, suffix) = match rule.side {
        Side::A => (a, b, &suffixes.a),
        Side::B => (b, a, &suffixes.b),
    };
    rule.skip_when
        .iter()
        .filter(|c| own.has_column(&c.column))
        .map(|c| {
            let column = if c.column == key || !other.has_column(&c.column) {
                c.column.clone()
            } else {
                format!("{}{suffix}", c.column)
            };
            Condition { column, ..c.clone() }
        })
        .collect()
}
