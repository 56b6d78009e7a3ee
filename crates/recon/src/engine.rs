use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::error::{ReconError, TableRole};
use crate::evidence::{maintenance_summary, review_summary};
use crate::family::{Propagation, SeedSet};
use crate::identity::{compare, duplicate_keys};
use crate::model::{
    DuplicateReport, HighlightTag, MaintenanceResult, OutputSheet, ReviewResult, ReviewSummary, RunMeta,
    SkuState, SkuTransition, Workflow,
};
use crate::reconcile::reconcile;
use crate::region::RegionConfig;
use crate::rules::{expected_values, non_empty, pattern_match};
use crate::schema::validate;
use crate::table::{normalize, normalized_key, Table};

pub const FAMILY_MEMBERS_SHEET: &str = "Family_Members";
pub const RETIRE_FINAL_SHEET: &str = "Final_Results";
pub const REASSIGN_SHEET: &str = "ReassignPrimaryChild";
pub const VISIBILITY_FINAL_SHEET: &str = "Final Results";
pub const VISIBILITY_ROWS_SHEET: &str = "Filtered Rows";
pub const FILTERED_RECORDS_SHEET: &str = "Filtered Records";

const RETIRED: &str = "Yes";
const NOT_VISIBLE: &str = "Not Visible Individually";
const HIDDEN: &str = "Yes";
const SHOWN: &str = "No";
const VISIBLE_CONFIGURABLE: &str = "Catalog, Search";
const VISIBLE_SIMPLE: &str = "Catalog";

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// New-SKU review of an import file against the requested SKU list.
///
/// `match_key` defaults to the region's review key.
pub fn review(
    config: &RegionConfig,
    import: &Table,
    sku_list: &Table,
    match_key: Option<&str>,
) -> Result<ReviewResult, ReconError> {
    let key = match_key.unwrap_or(config.review.match_key.as_str());
    let rules = &config.review;

    let schema = validate(import, &rules.required_attributes);
    let identity = compare(import, sku_list, key)?;
    let duplicates = DuplicateReport {
        import: duplicate_keys(import, TableRole::Export, key)?,
        sku_list: duplicate_keys(sku_list, TableRole::Ticket, key)?,
    };
    let fields = reconcile(import, sku_list, key, &rules.comparisons, &rules.suffixes)?;

    let mut result = ReviewResult {
        meta: RunMeta::new(Workflow::Review, Some(config.region), key),
        schema,
        identity,
        duplicates,
        fields,
        expected: expected_values(import, &rules.expected),
        non_empty: non_empty(import, &rules.non_empty_fields),
        patterns: pattern_match(import, config.patterns()),
        primary_child: non_empty(import, std::slice::from_ref(&config.primary_child_column)),
        summary: ReviewSummary::default(),
    };
    result.summary = review_summary(&result, import.len(), sku_list.len());

    log::info!(
        "review ({}): {} import row(s), {} missing, {} extra, {} field mismatch(es)",
        config.region,
        import.len(),
        result.summary.missing_in_import,
        result.summary.extra_in_import,
        result.summary.field_mismatches
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// Maintenance
// ---------------------------------------------------------------------------

/// Admin note stamped on retired rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetirementNote {
    pub ticket: Option<String>,
    pub initials: String,
}

impl RetirementNote {
    pub fn new(ticket: Option<String>, initials: impl Into<String>) -> Self {
        Self {
            ticket,
            initials: initials.into(),
        }
    }

    pub fn render(&self) -> String {
        let ticket = self
            .ticket
            .as_deref()
            .and_then(|t| normalized_key(Some(t)))
            .unwrap_or("X");
        format!("Ticket {ticket}, Retired - {}", self.initials.trim())
    }
}

fn check_identifier(identifier: &str) -> Result<(), ReconError> {
    if identifier.trim().is_empty() {
        return Err(ReconError::InvalidInput("identifier column must not be blank".into()));
    }
    Ok(())
}

fn note_identifier(config: &RegionConfig, identifier: &str) {
    if !config.identifier_column_candidates.iter().any(|c| c == identifier) {
        log::warn!("'{identifier}' is not a listed identifier column for {}", config.region);
    }
}

fn with_required(columns: &[String], extra: &[&String]) -> Vec<String> {
    columns
        .iter()
        .chain(extra.iter().copied())
        .cloned()
        .collect()
}

fn transitions(config: &RegionConfig, table: &Table, identifier: &str, state: SkuState) -> Vec<SkuTransition> {
    table
        .rows()
        .filter_map(|r| {
            let sku = normalized_key(r.get(&config.sku_column)).or_else(|| normalized_key(r.get(identifier)))?;
            Some(SkuTransition {
                sku: sku.to_string(),
                state,
            })
        })
        .collect()
}

fn highlight_primary(config: &RegionConfig, sheet: OutputSheet) -> OutputSheet {
    let primary = config.primary_condition();
    sheet.highlight_where(&config.primary_child_column, HighlightTag::PrimaryChild, |v| primary.holds_for(v))
}

/// Eligible family members of the ticket's SKUs, for choosing a new primary child.
pub fn primary_child(
    config: &RegionConfig,
    export: &Table,
    ticket: &Table,
    identifier: &str,
) -> Result<MaintenanceResult, ReconError> {
    check_identifier(identifier)?;
    note_identifier(config, identifier);
    let seeds = SeedSet::from_table(ticket, identifier)?;
    let schema = validate(
        export,
        &with_required(&config.columns.primary_child, &[&config.retired_column, &config.stealth_column]),
    );

    let prop = Propagation::new(identifier, &config.group_column);
    let selection = prop.propagate(export, &seeds, &config.eligibility.family)?;
    let members = selection.eligible.table.project(&config.columns.primary_child);
    let sheet = highlight_primary(config, OutputSheet::new(FAMILY_MEMBERS_SHEET, members));

    let primary = config.primary_condition();
    let current: Vec<usize> = selection
        .eligible
        .rows
        .iter()
        .copied()
        .filter(|&i| export.row_ref(i).is_some_and(|r| primary.holds(r)))
        .collect();
    let transitions = transitions(
        config,
        &export.select_rows(&current),
        identifier,
        SkuState::PendingChange.commit(Workflow::PrimaryChild),
    );

    let summary = maintenance_summary(
        seeds.len(),
        selection.base.len(),
        selection.group_ids.len(),
        sheet.table.len(),
        0,
    );
    log::info!(
        "primary child ({}): {} family member(s) across {} group(s)",
        config.region,
        summary.output_rows,
        summary.groups
    );

    Ok(MaintenanceResult {
        meta: RunMeta::new(Workflow::PrimaryChild, Some(config.region), identifier),
        schema,
        summary,
        transitions,
        sheets: vec![sheet],
    })
}

/// Retire the ticket's SKUs and list reassignment candidates for families
/// losing their primary child.
pub fn retire(
    config: &RegionConfig,
    export: &Table,
    ticket: &Table,
    identifier: &str,
    note: &RetirementNote,
) -> Result<MaintenanceResult, ReconError> {
    check_identifier(identifier)?;
    if note.initials.trim().is_empty() {
        return Err(ReconError::MissingInitials);
    }
    note_identifier(config, identifier);
    let seeds = SeedSet::from_table(ticket, identifier)?;

    let mut required = with_required(&config.columns.retire, &[&config.group_column, &config.primary_child_column]);
    required.extend(config.columns.reassign.iter().cloned());
    let schema = validate(export, &required);

    let prop = Propagation::new(identifier, &config.group_column);
    let retirement = prop.retire_and_reassign(
        export,
        &seeds,
        &config.primary_condition(),
        &config.eligibility.reassign,
    )?;

    let final_results = retirement
        .seeds
        .table
        .project(&config.columns.retire)
        .assign_literal(&config.retired_column, RETIRED)
        .assign_literal(&config.visibility_column, NOT_VISIBLE)
        .assign_literal(&config.hide_column, HIDDEN)
        .assign_literal(&config.admin_notes_column, &note.render());
    let final_sheet = highlight_primary(config, OutputSheet::new(RETIRE_FINAL_SHEET, final_results));

    let skip_reassign = config.is_non_unique(identifier);
    if skip_reassign {
        log::info!("reassignment skipped: '{identifier}' does not identify a single record");
    }

    let mut sheets = vec![final_sheet];
    if !skip_reassign && !retirement.candidates.is_empty() {
        let candidates = retirement.candidates.table.project(&config.columns.reassign);
        sheets.push(OutputSheet::new(REASSIGN_SHEET, candidates));
    }

    let mut summary = maintenance_summary(
        seeds.len(),
        retirement.seeds.len(),
        retirement.primary_groups.len(),
        sheets[0].table.len(),
        sheets.get(1).map_or(0, |s| s.table.len()),
    );
    summary.reassignment_skipped = skip_reassign;

    let transitions = transitions(
        config,
        &retirement.seeds.table,
        identifier,
        SkuState::PendingChange.commit(Workflow::Retire),
    );
    log::info!(
        "retire ({}): {} row(s) retired, {} reassignment candidate(s)",
        config.region,
        summary.output_rows,
        summary.secondary_rows
    );

    Ok(MaintenanceResult {
        meta: RunMeta::new(Workflow::Retire, Some(config.region), identifier),
        schema,
        summary,
        transitions,
        sheets,
    })
}

/// Re-enable the ticket's SKUs together with the configurable parents of their families.
pub fn visibility(
    config: &RegionConfig,
    export: &Table,
    ticket: &Table,
    identifier: &str,
) -> Result<MaintenanceResult, ReconError> {
    check_identifier(identifier)?;
    note_identifier(config, identifier);
    let seeds = SeedSet::from_table(ticket, identifier)?;
    let schema = validate(export, &config.columns.visibility);

    let prop = Propagation::new(identifier, &config.group_column);
    let selection = prop.propagate(export, &seeds, &config.eligibility.visibility_parent)?;

    let mut seen: HashSet<usize> = HashSet::new();
    let rows: Vec<usize> = selection
        .base
        .rows
        .iter()
        .chain(&selection.eligible.rows)
        .copied()
        .filter(|i| seen.insert(*i))
        .collect();
    let combined = export.select_rows(&rows);

    let product_type = config.product_type_column.as_str();
    let visibility_column = config.visibility_column.as_str();
    let final_results = combined
        .project(&config.columns.visibility)
        .assign_literal(&config.hide_column, SHOWN);
    let final_results = final_results.assign(visibility_column, |r| {
        let kind = normalize(combined.value(r.index(), product_type)).to_lowercase();
        match kind.as_str() {
            "configurable" => Some(VISIBLE_CONFIGURABLE.to_string()),
            "simple" => Some(VISIBLE_SIMPLE.to_string()),
            _ => r.get(visibility_column).map(str::to_string),
        }
    });

    let summary = maintenance_summary(
        seeds.len(),
        selection.base.len(),
        selection.group_ids.len(),
        final_results.len(),
        combined.len(),
    );
    let transitions = transitions(
        config,
        &combined,
        identifier,
        SkuState::PendingChange.commit(Workflow::Visibility),
    );
    log::info!(
        "visibility ({}): {} row(s), {} configurable parent(s) added",
        config.region,
        summary.output_rows,
        rows.len() - selection.base.len()
    );

    Ok(MaintenanceResult {
        meta: RunMeta::new(Workflow::Visibility, Some(config.region), identifier),
        schema,
        summary,
        transitions,
        sheets: vec![
            OutputSheet::new(VISIBILITY_FINAL_SHEET, final_results),
            OutputSheet::new(VISIBILITY_ROWS_SHEET, combined),
        ],
    })
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FilterMode {
    /// Rows where any filter-file column value occurs in the same main column.
    BySku,
    /// Every member of the families of rows matching the identifier.
    ByFamily { identifier: String },
}

/// Raw main-table rows selected by a filter file. No projection, no overwrites.
pub fn filter_records(
    config: &RegionConfig,
    main: &Table,
    filter: &Table,
    mode: &FilterMode,
) -> Result<MaintenanceResult, ReconError> {
    let (rows, requested, groups, key) = match mode {
        FilterMode::BySku => {
            let (rows, requested) = filter_by_columns(main, filter)?;
            (rows, requested, 0, filter.columns().join(", "))
        }
        FilterMode::ByFamily { identifier } => {
            check_identifier(identifier)?;
            let seeds = SeedSet::from_table(filter, identifier)?;
            let prop = Propagation::new(identifier, &config.group_column);
            let selection = prop.propagate(main, &seeds, &[])?;
            (selection.eligible.rows, seeds.len(), selection.group_ids.len(), identifier.clone())
        }
    };

    let filtered = main.select_rows(&rows);
    log::info!("filter: {} of {} record(s) selected", filtered.len(), main.len());

    let summary = maintenance_summary(requested, filtered.len(), groups, filtered.len(), 0);
    Ok(MaintenanceResult {
        meta: RunMeta::new(Workflow::Filter, None, &key),
        schema: validate(main, filter.columns()),
        summary,
        transitions: Vec::new(),
        sheets: vec![OutputSheet::new(FILTERED_RECORDS_SHEET, filtered)],
    })
}

fn filter_by_columns(main: &Table, filter: &Table) -> Result<(Vec<usize>, usize), ReconError> {
    for column in filter.columns() {
        if !main.has_column(column) {
            return Err(ReconError::MissingColumn {
                table: TableRole::Export,
                column: column.clone(),
            });
        }
    }

    let wanted: Vec<(&str, BTreeSet<&str>)> = filter
        .columns()
        .iter()
        .map(|column| {
            let values: BTreeSet<&str> = filter
                .column_values(column)
                .into_iter()
                .flatten()
                .filter_map(normalized_key)
                .collect();
            (column.as_str(), values)
        })
        .filter(|(_, values)| !values.is_empty())
        .collect();
    let requested = wanted.iter().map(|(_, v)| v.len()).sum();

    let rows = main.matching_rows(|r| {
        wanted
            .iter()
            .any(|(column, values)| normalized_key(r.get(column)).is_some_and(|v| values.contains(v)))
    });
    Ok((rows, requested))
}
