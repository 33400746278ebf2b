use std::fmt;

/// Which input snapshot a schema problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Old,
    New,
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

#[derive(Debug)]
pub enum RosterError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing domain, empty column name, etc.).
    ConfigValidation(String),
    /// A key, name or identifier column is absent from one of the tables.
    MissingColumn {
        table: TableSide,
        column: String,
        available: Vec<String>,
    },
    /// Table could not be read, parsed or written.
    Io { path: String, message: String },
}

impl RosterError {
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { table, column, available } => {
                write!(
                    f,
                    "column '{column}' not found in {table} file (available: {})",
                    available
                        .iter()
                        .map(|c| format!("'{c}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Self::Io { path, message } => write!(f, "{path}: {message}"),
        }
    }
}

impl std::error::Error for RosterError {}
