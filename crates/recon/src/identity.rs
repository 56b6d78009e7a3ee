use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::error::{ReconError, TableRole};
use crate::table::{normalized_key, Table};

/// Identifier set differences between two tables on one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityDiff {
    /// Keys present in B but not in A.
    pub missing_in_a: BTreeSet<String>,
    /// Keys present in A but not in B.
    pub extra_in_a: BTreeSet<String>,
}

impl IdentityDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_in_a.is_empty() && self.extra_in_a.is_empty()
    }
}

/// A key value occurring on more than one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub key: String,
    pub count: usize,
    pub rows: Vec<usize>,
}

/// Fail with `MissingKey` unless `key` is a column of `table`.
pub fn require_key(table: &Table, role: TableRole, key: &str) -> Result<(), ReconError> {
    if table.has_column(key) {
        Ok(())
    } else {
        Err(ReconError::MissingKey {
            table: role,
            column: key.to_string(),
        })
    }
}

/// Distinct non-blank normalized values of `key`. Empty set when the column is absent.
pub fn key_set(table: &Table, key: &str) -> BTreeSet<String> {
    table
        .column_values(key)
        .into_iter()
        .flatten()
        .filter_map(normalized_key)
        .map(str::to_string)
        .collect()
}

/// Compare identifier sets of `a` (export/import side) and `b` (ticket side).
pub fn compare(a: &Table, b: &Table, key: &str) -> Result<IdentityDiff, ReconError> {
    require_key(a, TableRole::Export, key)?;
    require_key(b, TableRole::Ticket, key)?;

    let keys_a = key_set(a, key);
    let keys_b = key_set(b, key);
    let diff = IdentityDiff {
        missing_in_a: keys_b.difference(&keys_a).cloned().collect(),
        extra_in_a: keys_a.difference(&keys_b).cloned().collect(),
    };
    log::debug!(
        "identity '{key}': {} missing, {} extra",
        diff.missing_in_a.len(),
        diff.extra_in_a.len()
    );
    Ok(diff)
}

/// Keys occurring more than once, ordered by first occurrence. Blank keys are ignored.
pub fn duplicate_keys(table: &Table, role: TableRole, key: &str) -> Result<Vec<DuplicateKey>, ReconError> {
    require_key(table, role, key)?;

    let mut order: Vec<DuplicateKey> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        let Some(k) = normalized_key(row.get(key)) else {
            continue;
        };
        match slots.get(k) {
            Some(&slot) => {
                order[slot].count += 1;
                order[slot].rows.push(row.index());
            }
            None => {
                slots.insert(k.to_string(), order.len());
                order.push(DuplicateKey {
                    key: k.to_string(),
                    count: 1,
                    rows: vec![row.index()],
                });
            }
        }
    }
    order.retain(|d| d.count > 1);
    Ok(order)
}
