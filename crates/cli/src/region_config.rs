//! `skuflow config`: inspect and validate region rules.

use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;
use skuflow_recon::{Region, RegionConfig};

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::{emit_json, resolve_region, CliError, GlobalOpts};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the active region rules as TOML (JSON with --json)
    #[command(after_help = "\
Examples:
  skuflow config show --region eu
  skuflow config show --region-config regions/custom.toml --json")]
    Show,

    /// Validate a region rules file (or every built-in region when omitted)
    #[command(after_help = "\
Examples:
  skuflow config validate regions/custom.toml
  skuflow config validate")]
    Validate {
        /// Region TOML file
        file: Option<PathBuf>,
    },
}

/// Outcome of validating one region rules source.
#[derive(Debug, Serialize)]
struct ConfigCheck {
    source: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
    #[serde(skip_serializing_if = "Option::is_none")]
    match_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ConfigCheck {
    fn new(source: String, parsed: Result<RegionConfig, String>) -> Self {
        match parsed {
            Ok(config) => Self {
                source,
                valid: true,
                region: Some(config.region),
                match_key: Some(config.review.match_key),
                error: None,
            },
            Err(error) => Self {
                source,
                valid: false,
                region: None,
                match_key: None,
                error: Some(error),
            },
        }
    }
}

pub fn cmd_config(opts: &GlobalOpts, cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Show => cmd_config_show(opts),
        ConfigCommands::Validate { file } => cmd_config_validate(opts, file),
    }
}

fn cmd_config_show(opts: &GlobalOpts) -> Result<(), CliError> {
    let config = resolve_region(opts)?;
    if opts.json {
        return emit_json(opts, &config);
    }
    let text = match &opts.region_config {
        None => RegionConfig::builtin_source(config.region).to_string(),
        Some(_) => toml::to_string_pretty(&config)
            .map_err(|e| CliError::general(format!("TOML serialization error: {e}")))?,
    };
    print!("{text}");
    Ok(())
}

fn cmd_config_validate(opts: &GlobalOpts, file: Option<PathBuf>) -> Result<(), CliError> {
    let checks: Vec<ConfigCheck> = match file.or_else(|| opts.region_config.clone()) {
        Some(path) => {
            let parsed = std::fs::read_to_string(&path)
                .map_err(|e| CliError::args(format!("cannot read {}: {e}", path.display())))?;
            vec![ConfigCheck::new(
                path.display().to_string(),
                RegionConfig::from_toml(&parsed).map_err(|e| e.to_string()),
            )]
        }
        None => Region::ALL
            .iter()
            .map(|&region| {
                ConfigCheck::new(
                    format!("builtin:{}", region.to_string().to_lowercase()),
                    RegionConfig::builtin(region).map_err(|e| e.to_string()),
                )
            })
            .collect(),
    };

    emit_json(opts, &checks)?;
    for check in &checks {
        match &check.error {
            None => eprintln!(
                "ok: {} ({}, match key '{}')",
                check.source,
                check.region.map(|r| r.to_string()).unwrap_or_default(),
                check.match_key.as_deref().unwrap_or(""),
            ),
            Some(error) => eprintln!("invalid: {}: {error}", check.source),
        }
    }

    if checks.iter().all(|c| c.valid) {
        Ok(())
    } else {
        Err(CliError::new(EXIT_INVALID_CONFIG, "region config is invalid"))
    }
}
