use thiserror::Error;

/// Which input a column or key was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    /// Authoritative catalog export (or the import file under review).
    Export,
    /// Change-request / ticket file (or the SKU list under review).
    Ticket,
}

impl std::fmt::Display for TableRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Export => write!(f, "export"),
            Self::Ticket => write!(f, "ticket"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconError {
    /// The chosen match key is absent from one of the inputs.
    #[error("{table} table: match key column '{column}' not found")]
    MissingKey { table: TableRole, column: String },
    /// A column the operation cannot run without is absent.
    #[error("{table} table: required column '{column}' not found")]
    MissingColumn { table: TableRole, column: String },
    /// Caller-supplied parameters that make the request meaningless.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Retirement requested without reviewer initials for the admin note.
    #[error("invalid input: retirement initials must not be blank")]
    MissingInitials,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Table(#[from] TableError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A pattern field carries a regex that does not compile.
    #[error("field '{field}': invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },
    /// Structurally valid TOML that fails semantic checks.
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("row {row}: expected {expected} value(s), found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' has {found} value(s), expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
}
