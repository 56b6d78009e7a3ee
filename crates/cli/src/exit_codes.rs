//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | Usage error (bad args, missing or unsupported file) |
//! | 3    | Review found discrepancies                          |
//! | 4    | Match key or required column missing from an input  |
//! | 5    | Input file could not be parsed                      |
//! | 6    | Invalid region configuration                        |
//! | 7    | Output file could not be written                    |

use skuflow_io::IoError;
use skuflow_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable input path, unknown extension.
pub const EXIT_USAGE: u8 = 2;

/// Review ran to completion and reported at least one discrepancy.
pub const EXIT_DISCREPANCIES: u8 = 3;

/// Match key or a column the operation requires is absent.
pub const EXIT_MISSING_COLUMN: u8 = 4;

/// Malformed CSV/Excel input.
pub const EXIT_PARSE: u8 = 5;

/// Region config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Writing reports failed.
pub const EXIT_WRITE: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::MissingKey { .. } | ReconError::MissingColumn { .. } => EXIT_MISSING_COLUMN,
        ReconError::InvalidInput(_) | ReconError::MissingInitials => EXIT_USAGE,
        ReconError::Config(_) => EXIT_INVALID_CONFIG,
        ReconError::Table(_) => EXIT_PARSE,
    }
}

/// Map a load/write error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Read { .. } | IoError::UnsupportedFormat { .. } => EXIT_USAGE,
        IoError::Csv { .. } | IoError::Excel { .. } | IoError::Table { .. } => EXIT_PARSE,
        IoError::Xlsx { .. } | IoError::CsvWrite { .. } => EXIT_WRITE,
    }
}
