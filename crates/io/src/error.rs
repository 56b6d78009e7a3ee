use std::path::PathBuf;

use skuflow_recon::TableError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write CSV {}: {source}", path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {}: {message}", path.display())]
    Excel { path: PathBuf, message: String },

    #[error("failed to write workbook {}: {source}", path.display())]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("unsupported file format '{extension}' for {} (expected csv, tsv, txt, xlsx, xlsm, xls, xlsb or ods)", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("{}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}
