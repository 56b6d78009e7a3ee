// skuflow CLI - catalog export review and SKU maintenance

mod exit_codes;
mod maintain;
mod region_config;
mod review;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use skuflow_io::IoError;
use skuflow_recon::{OutputSheet, ReconError, Region, RegionConfig, Table};
use tracing_subscriber::EnvFilter;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_SUCCESS, EXIT_USAGE};

/// Environment variable holding the log filter (e.g. `skuflow_recon=debug`).
const LOG_ENV: &str = "SKUFLOW_LOG";

#[derive(Parser)]
#[command(name = "skuflow")]
#[command(about = "Catalog export review and SKU family maintenance")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Built-in region rules to apply
    #[arg(long, global = true, default_value = "us", env = "SKUFLOW_REGION")]
    region: Region,

    /// Region rules from a TOML file instead of the built-ins
    #[arg(long, global = true, value_name = "TOML")]
    region_config: Option<PathBuf>,

    /// Print the JSON report to stdout
    #[arg(long, global = true)]
    json: bool,

    /// Write output sheets to this file (.xlsx, .csv or .tsv)
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Debug logging on stderr (overrides SKUFLOW_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Review a new-SKU import file against the requested SKU list
    #[command(after_help = "\
Examples:
  skuflow review --import import.xlsx --sku-list skus.xlsx
  skuflow review --region eu --import import.xlsx --sku-list skus.csv -o review.xlsx
  skuflow review --import import.csv --sku-list skus.csv --match-key 'Manufacturer Sku' --json")]
    Review {
        /// Import file under review
        #[arg(long)]
        import: PathBuf,

        /// Requested SKU list
        #[arg(long)]
        sku_list: PathBuf,

        /// Join column (defaults to the region's review match key)
        #[arg(long)]
        match_key: Option<String>,
    },

    /// List the eligible family members of the ticket's SKUs
    #[command(after_help = "\
Examples:
  skuflow primary-child --export export.xlsx --ticket ticket.xlsx -o family.xlsx")]
    PrimaryChild {
        #[command(flatten)]
        inputs: maintain::MaintenanceInputs,
    },

    /// Retire the ticket's SKUs and list primary-child reassignment candidates
    #[command(after_help = "\
Examples:
  skuflow retire --export export.xlsx --ticket ticket.xlsx --initials JL --ticket-id 4521 -o retire.xlsx")]
    Retire {
        #[command(flatten)]
        inputs: maintain::MaintenanceInputs,

        /// Initials stamped into the admin notes
        #[arg(long)]
        initials: String,

        /// Ticket number for the admin notes (rendered as X when omitted)
        #[arg(long)]
        ticket_id: Option<String>,
    },

    /// Re-enable visibility for the ticket's SKUs and their configurable parents
    #[command(after_help = "\
Examples:
  skuflow visibility --export export.xlsx --ticket ticket.csv -o visibility.xlsx")]
    Visibility {
        #[command(flatten)]
        inputs: maintain::MaintenanceInputs,
    },

    /// Select main-file rows matching a filter file
    #[command(after_help = "\
Examples:
  skuflow filter --main export.xlsx --filter skus.csv -o filtered.xlsx
  skuflow filter --main export.xlsx --filter skus.csv --by-family --identifier 'Manufacturer Sku'")]
    Filter {
        /// File to select rows from
        #[arg(long)]
        main: PathBuf,

        /// File whose columns and values drive the selection
        #[arg(long)]
        filter: PathBuf,

        /// Select whole families of matching rows
        #[arg(long)]
        by_family: bool,

        /// Identifier column for --by-family (defaults to the region's SKU column)
        #[arg(long, requires = "by_family")]
        identifier: Option<String>,
    },

    /// Inspect or validate region configuration
    Config {
        #[command(subcommand)]
        command: region_config::ConfigCommands,
    },
}

/// Options shared by every subcommand.
pub struct GlobalOpts {
    pub region: Region,
    pub region_config: Option<PathBuf>,
    pub json: bool,
    pub output: Option<PathBuf>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  skuflow-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // try_init also installs the log -> tracing bridge
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = GlobalOpts {
        region: cli.region,
        region_config: cli.region_config,
        json: cli.json,
        output: cli.output,
    };

    let result = match cli.command {
        Commands::Review { import, sku_list, match_key } => review::cmd_review(&opts, &import, &sku_list, match_key.as_deref()),
        Commands::PrimaryChild { inputs } => maintain::cmd_primary_child(&opts, &inputs),
        Commands::Retire { inputs, initials, ticket_id } => maintain::cmd_retire(&opts, &inputs, &initials, ticket_id),
        Commands::Visibility { inputs } => maintain::cmd_visibility(&opts, &inputs),
        Commands::Filter { main, filter, by_family, identifier } => {
            maintain::cmd_filter(&opts, &main, &filter, by_family, identifier)
        }
        Commands::Config { command } => region_config::cmd_config(&opts, command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingKey { .. } => Some("pass --match-key or --identifier to choose another column".to_string()),
            ReconError::Config(_) => Some("run `skuflow config validate <file>` for details".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self::new(io_exit_code(&err), err.to_string())
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Region rules from `--region-config` when given, else the built-in `--region`.
pub fn resolve_region(opts: &GlobalOpts) -> Result<RegionConfig, CliError> {
    match &opts.region_config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| CliError::args(format!("cannot read region config {}: {e}", path.display())))?;
            let config = RegionConfig::from_toml(&source)
                .map_err(|e| CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", path.display())))?;
            log::debug!("region rules from {} ({})", path.display(), config.region);
            Ok(config)
        }
        None => RegionConfig::builtin(opts.region).map_err(|e| CliError::from(ReconError::from(e))),
    }
}

pub fn load_table(path: &Path) -> Result<Table, CliError> {
    Ok(skuflow_io::load(path)?)
}

/// Write sheets to `--output` when given.
pub fn write_sheets(opts: &GlobalOpts, sheets: &[OutputSheet]) -> Result<(), CliError> {
    let Some(path) = &opts.output else {
        return Ok(());
    };
    for written in skuflow_io::write(path, sheets)? {
        eprintln!("wrote {}", written.display());
    }
    Ok(())
}

/// Print the JSON report when `--json` is set.
pub fn emit_json<T: serde::Serialize>(opts: &GlobalOpts, report: &T) -> Result<(), CliError> {
    if !opts.json {
        return Ok(());
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}
