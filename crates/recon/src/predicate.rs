use serde::{Deserialize, Serialize};

use crate::error::{ReconError, TableRole};
use crate::table::{normalize, RowRef, Table};

/// Equality test on one column of a row.
///
/// The cell is trimmed before comparing. Comparison ignores case unless
/// `case_sensitive` is set; lifecycle flags arrive as "No", "no" and "NO".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Condition {
    pub column: String,
    pub equals: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    pub fn new(column: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            equals: equals.into(),
            case_sensitive: false,
        }
    }

    pub fn exact(column: impl Into<String>, equals: impl Into<String>) -> Self {
        Self {
            case_sensitive: true,
            ..Self::new(column, equals)
        }
    }

    pub fn holds(&self, row: RowRef<'_>) -> bool {
        self.holds_for(row.get(&self.column))
    }

    /// Test a raw cell value against this condition.
    pub fn holds_for(&self, value: Option<&str>) -> bool {
        let value = normalize(value);
        if self.case_sensitive {
            value == self.equals
        } else {
            value.to_lowercase() == self.equals.to_lowercase()
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = if self.case_sensitive { "==" } else { "~=" };
        write!(f, "'{}' {op} '{}'", self.column, self.equals)
    }
}

/// True when every condition holds. An empty list admits every row.
pub fn all_hold(conditions: &[Condition], row: RowRef<'_>) -> bool {
    conditions.iter().all(|c| c.holds(row))
}

/// Fail with `MissingColumn` unless every condition column is present.
pub fn require_columns(table: &Table, role: TableRole, conditions: &[Condition]) -> Result<(), ReconError> {
    for c in conditions {
        if !table.has_column(&c.column) {
            return Err(ReconError::MissingColumn {
                table: role,
                column: c.column.clone(),
            });
        }
    }
    Ok(())
}
