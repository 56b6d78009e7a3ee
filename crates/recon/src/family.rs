//! Family propagation: from a handful of requested identifiers to every
//! related variant record sharing a group key.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::{ReconError, TableRole};
use crate::identity::{key_set, require_key};
use crate::predicate::{all_hold, require_columns, Condition};
use crate::table::{normalized_key, Table};

/// Normalized, non-blank identifiers requested by a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSet {
    keys: BTreeSet<String>,
}

impl SeedSet {
    /// Distinct values of `key` in the ticket table.
    pub fn from_table(ticket: &Table, key: &str) -> Result<Self, ReconError> {
        require_key(ticket, TableRole::Ticket, key)?;
        Ok(Self {
            keys: key_set(ticket, key),
        })
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys
                .into_iter()
                .filter_map(|k| normalized_key(Some(k.as_ref())).map(str::to_string))
                .collect(),
        }
    }

    pub fn contains(&self, value: Option<&str>) -> bool {
        normalized_key(value).is_some_and(|k| self.keys.contains(k))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

/// One derived stage: the selected export rows and their source indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub rows: Vec<usize>,
    pub table: Table,
}

impl Stage {
    fn select(export: &Table, rows: Vec<usize>) -> Self {
        let table = export.select_rows(&rows);
        Self { rows, table }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Seed rows, their families, and the eligible family members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilySelection {
    pub base: Stage,
    pub group_ids: BTreeSet<String>,
    pub family: Stage,
    pub eligible: Stage,
}

/// Where the propagation reads its keys from.
#[derive(Debug, Clone, Copy)]
pub struct Propagation<'a> {
    pub key_column: &'a str,
    pub group_column: &'a str,
}

impl<'a> Propagation<'a> {
    pub fn new(key_column: &'a str, group_column: &'a str) -> Self {
        Self {
            key_column,
            group_column,
        }
    }

    fn check(&self, export: &Table, eligibility: &[Condition]) -> Result<(), ReconError> {
        require_key(export, TableRole::Export, self.key_column)?;
        if !export.has_column(self.group_column) {
            return Err(ReconError::MissingColumn {
                table: TableRole::Export,
                column: self.group_column.to_string(),
            });
        }
        require_columns(export, TableRole::Export, eligibility)
    }

    fn base_rows(&self, export: &Table, seeds: &SeedSet) -> Vec<usize> {
        export.matching_rows(|r| seeds.contains(r.get(self.key_column)))
    }

    fn groups_of(&self, export: &Table, rows: &[usize]) -> BTreeSet<String> {
        rows.iter()
            .filter_map(|&i| normalized_key(export.value(i, self.group_column)))
            .map(str::to_string)
            .collect()
    }

    fn members_of(&self, export: &Table, groups: &BTreeSet<String>) -> Vec<usize> {
        export.matching_rows(|r| normalized_key(r.get(self.group_column)).is_some_and(|g| groups.contains(g)))
    }

    /// Run all three stages. An empty seed match yields an empty selection.
    pub fn propagate(
        &self,
        export: &Table,
        seeds: &SeedSet,
        eligibility: &[Condition],
    ) -> Result<FamilySelection, ReconError> {
        self.check(export, eligibility)?;

        let base = self.base_rows(export, seeds);
        if base.is_empty() {
            log::warn!(
                "no export rows matched {} requested '{}' value(s)",
                seeds.len(),
                self.key_column
            );
        }
        let group_ids = self.groups_of(export, &base);
        let family = self.members_of(export, &group_ids);
        let eligible: Vec<usize> = family
            .iter()
            .copied()
            .filter(|&i| export.row_ref(i).is_some_and(|r| all_hold(eligibility, r)))
            .collect();

        log::debug!(
            "propagation on '{}': {} seed row(s), {} group(s), {} member(s), {} eligible",
            self.group_column,
            base.len(),
            group_ids.len(),
            family.len(),
            eligible.len()
        );

        Ok(FamilySelection {
            base: Stage::select(export, base),
            group_ids,
            family: Stage::select(export, family),
            eligible: Stage::select(export, eligible),
        })
    }

    /// Every eligible member of the seeds' families.
    pub fn broaden(&self, export: &Table, seeds: &SeedSet, eligibility: &[Condition]) -> Result<Stage, ReconError> {
        Ok(self.propagate(export, seeds, eligibility)?.eligible)
    }

    /// Seed rows to retire, plus the other eligible members of the families
    /// whose primary child is being retired.
    pub fn retire_and_reassign(
        &self,
        export: &Table,
        seeds: &SeedSet,
        primary: &Condition,
        eligibility: &[Condition],
    ) -> Result<Retirement, ReconError> {
        self.check(export, eligibility)?;
        require_columns(export, TableRole::Export, std::slice::from_ref(primary))?;

        let base = self.base_rows(export, seeds);
        if base.is_empty() {
            log::warn!("retirement: no export rows matched the requested '{}' values", self.key_column);
        }
        let primary_rows: Vec<usize> = base
            .iter()
            .copied()
            .filter(|&i| export.row_ref(i).is_some_and(|r| primary.holds(r)))
            .collect();
        let primary_groups = self.groups_of(export, &primary_rows);

        let seed_rows: HashSet<usize> = base.iter().copied().collect();
        let candidates: Vec<usize> = self
            .members_of(export, &primary_groups)
            .into_iter()
            .filter(|i| !seed_rows.contains(i))
            .filter(|&i| export.row_ref(i).is_some_and(|r| all_hold(eligibility, r)))
            .collect();

        log::debug!(
            "retirement: {} seed row(s), {} primary, {} reassignment candidate(s)",
            base.len(),
            primary_rows.len(),
            candidates.len()
        );

        Ok(Retirement {
            seeds: Stage::select(export, base),
            primary_groups,
            candidates: Stage::select(export, candidates),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Retirement {
    /// Rows moving to the retired state.
    pub seeds: Stage,
    /// Families losing their primary child.
    pub primary_groups: BTreeSet<String>,
    /// Rows that may take over as primary child. Never includes a seed row.
    pub candidates: Stage,
}
