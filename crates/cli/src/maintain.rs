//! `skuflow primary-child | retire | visibility | filter`: ticket-driven SKU maintenance.

use std::path::{Path, PathBuf};

use clap::Args;
use skuflow_recon::{
    filter_records, primary_child, retire, visibility, FilterMode, MaintenanceResult, ReconError, RetirementNote,
};

use crate::{emit_json, load_table, resolve_region, write_sheets, CliError, GlobalOpts};

#[derive(Args)]
pub struct MaintenanceInputs {
    /// Catalog export file
    #[arg(long)]
    pub export: PathBuf,

    /// Ticket / change-request file listing the SKUs to act on
    #[arg(long)]
    pub ticket: PathBuf,

    /// Identifier column shared by export and ticket (defaults to the region's SKU column)
    #[arg(long)]
    pub identifier: Option<String>,
}

pub fn cmd_primary_child(opts: &GlobalOpts, inputs: &MaintenanceInputs) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    let identifier = inputs.identifier.as_deref().unwrap_or(&config.sku_column);
    let export = load_table(&inputs.export)?;
    let ticket = load_table(&inputs.ticket)?;

    let result = primary_child(&config, &export, &ticket, identifier)?;
    finish(opts, &result)
}

pub fn cmd_retire(
    opts: &GlobalOpts,
    inputs: &MaintenanceInputs,
    initials: &str,
    ticket_id: Option<String>,
) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    let identifier = inputs.identifier.as_deref().unwrap_or(&config.sku_column);
    let export = load_table(&inputs.export)?;
    let ticket = load_table(&inputs.ticket)?;

    let note = RetirementNote::new(ticket_id, initials);
    let result = retire(&config, &export, &ticket, identifier, &note).map_err(|e| match e {
        ReconError::MissingInitials => CliError::from(e).with_hint("pass --initials with the reviewer's initials"),
        e => CliError::from(e),
    })?;
    if result.summary.reassignment_skipped {
        eprintln!("note: '{identifier}' is not unique per SKU; reassignment candidates were not listed");
    }
    finish(opts, &result)
}

pub fn cmd_visibility(opts: &GlobalOpts, inputs: &MaintenanceInputs) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    let identifier = inputs.identifier.as_deref().unwrap_or(&config.sku_column);
    let export = load_table(&inputs.export)?;
    let ticket = load_table(&inputs.ticket)?;

    let result = visibility(&config, &export, &ticket, identifier)?;
    finish(opts, &result)
}

pub fn cmd_filter(
    opts: &GlobalOpts,
    main: &Path,
    filter: &Path,
    by_family: bool,
    identifier: Option<String>,
) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    let mode = if by_family {
        FilterMode::ByFamily {
            identifier: identifier.unwrap_or_else(|| config.sku_column.clone()),
        }
    } else {
        FilterMode::BySku
    };
    let main_table = load_table(main)?;
    let filter_table = load_table(filter)?;

    let result = filter_records(&config, &main_table, &filter_table, &mode)?;
    finish(opts, &result)
}

fn finish(opts: &GlobalOpts, result: &MaintenanceResult) -> Result<(), CliError> {
    emit_json(opts, result)?;
    print_summary(result);
    write_sheets(opts, &result.sheets)
}

/// Human summary to stderr.
fn print_summary(result: &MaintenanceResult) {
    let s = &result.summary;
    eprintln!(
        "{} ({}): {} requested, {} matched row(s), {} famil{}",
        result.meta.workflow,
        result.meta.match_key,
        s.requested,
        s.matched_rows,
        s.groups,
        if s.groups == 1 { "y" } else { "ies" },
    );
    for sheet in &result.sheets {
        eprintln!("  {}: {} row(s)", sheet.name, sheet.table.len());
    }
    if !result.schema.present {
        eprintln!("  columns not in export: {}", result.schema.missing.join(", "));
    }
}
