use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::email::{OverrideKey, OverrideTable};
use crate::error::RosterError;

pub const DEFAULT_COMPARISON_COLUMN: &str = "Employee ID";
pub const DEFAULT_FIRST_NAME_COLUMN: &str = "First Name [Required]";
pub const DEFAULT_LAST_NAME_COLUMN: &str = "Last Name";
pub const DEFAULT_IDENTIFIER_COLUMN: &str = "Employee ID";
pub const DEFAULT_EMAIL_COLUMN: &str = "Email";
pub const DEFAULT_OUTPUT_PATH: &str = "processed_new_entries.csv";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Column mapping, mail domain, destination and manual overrides for one run.
///
/// Every field but `domain` has a default, so a config file only needs:
///
/// ```toml
/// domain = "uck.ac.in"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Mail domain appended after `@`. Required.
    pub domain: String,
    /// Key column in the new snapshot.
    pub comparison_column: String,
    /// Key column in the old snapshot, when it is named differently.
    pub old_file_comparison_column: Option<String>,
    pub first_name_column: String,
    pub last_name_column: String,
    /// Column the address suffix is taken from.
    pub identifier_column: String,
    /// Column the derived address is written to (created if absent).
    pub email_column: String,
    pub output_path: PathBuf,
    /// Single-character field delimiter. Sniffed on input when unset.
    pub delimiter: Option<String>,
    pub overrides: Vec<OverrideEntry>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            comparison_column: DEFAULT_COMPARISON_COLUMN.into(),
            old_file_comparison_column: None,
            first_name_column: DEFAULT_FIRST_NAME_COLUMN.into(),
            last_name_column: DEFAULT_LAST_NAME_COLUMN.into(),
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.into(),
            email_column: DEFAULT_EMAIL_COLUMN.into(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            delimiter: None,
            overrides: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// `[[overrides]]` entry: the exact input triple and the address to use for it.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideEntry {
    pub first_name: CellText,
    pub last_name: CellText,
    pub identifier: CellText,
    pub email: String,
}

impl OverrideEntry {
    pub fn key(&self) -> OverrideKey {
        OverrideKey::new(&self.first_name.0, &self.last_name.0, &self.identifier.0)
    }
}

/// A config value compared against a table cell. Accepts TOML strings and numbers
/// (`identifier = 12345`) and keeps the text form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCell")]
pub struct CellText(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawCell> for CellText {
    fn from(raw: RawCell) -> Self {
        match raw {
            RawCell::Text(s) => CellText(s),
            RawCell::Integer(n) => CellText(n.to_string()),
            RawCell::Float(x) => CellText(x.to_string()),
        }
    }
}

impl From<&str> for CellText {
    fn from(s: &str) -> Self {
        CellText(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RosterConfig {
    /// Defaults plus the given domain.
    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Deserialize without validating. Callers that layer further settings on
    /// top (command-line flags) validate once they are done.
    pub fn parse(input: &str) -> Result<Self, RosterError> {
        toml::from_str(input).map_err(|e| RosterError::ConfigParse(e.to_string()))
    }

    pub fn from_toml(input: &str) -> Result<Self, RosterError> {
        let config = Self::parse(input)?;
        config.validate()?;
        Ok(config)
    }

    /// [`parse`](Self::parse) the file at `path`.
    pub fn read(path: &Path) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RosterError::io(path.display().to_string(), e))?;
        Self::parse(&text)
    }

    pub fn from_file(path: &Path) -> Result<Self, RosterError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Key column of the old snapshot, falling back to `comparison_column`.
    pub fn old_key_column(&self) -> &str {
        self.old_file_comparison_column
            .as_deref()
            .unwrap_or(&self.comparison_column)
    }

    /// Configured delimiter as a byte. Call after [`validate`](Self::validate).
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter
            .as_deref()
            .and_then(|d| d.bytes().next())
    }

    pub fn override_table(&self) -> OverrideTable {
        self.overrides
            .iter()
            .map(|o| (o.key(), o.email.trim().to_string()))
            .collect()
    }

    /// Full check: domain, table layout and overrides.
    pub fn validate(&self) -> Result<(), RosterError> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(RosterError::ConfigValidation("domain is required".into()));
        }
        if domain.contains('@') || domain.chars().any(char::is_whitespace) {
            return Err(RosterError::ConfigValidation(format!(
                "domain must be a bare host name, got '{}'",
                self.domain
            )));
        }

        self.validate_layout()?;

        let mut seen = HashSet::new();
        for entry in &self.overrides {
            let key = entry.key();
            if entry.email.trim().is_empty() {
                return Err(RosterError::ConfigValidation(format!(
                    "override for '{key}' has an empty email"
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(RosterError::ConfigValidation(format!(
                    "duplicate override for '{key}'"
                )));
            }
        }

        Ok(())
    }

    /// Column names, output path and delimiter only. Enough for a diff-only run,
    /// which needs no domain.
    pub fn validate_layout(&self) -> Result<(), RosterError> {
        let columns = [
            ("comparison_column", Some(self.comparison_column.as_str())),
            (
                "old_file_comparison_column",
                self.old_file_comparison_column.as_deref(),
            ),
            ("first_name_column", Some(self.first_name_column.as_str())),
            ("last_name_column", Some(self.last_name_column.as_str())),
            ("identifier_column", Some(self.identifier_column.as_str())),
            ("email_column", Some(self.email_column.as_str())),
        ];
        for (field, value) in columns {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(RosterError::ConfigValidation(format!(
                        "{field} must not be empty"
                    )));
                }
            }
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(RosterError::ConfigValidation(
                "output_path must not be empty".into(),
            ));
        }

        if let Some(ref d) = self.delimiter {
            if d.len() != 1 || !d.is_ascii() {
                return Err(RosterError::ConfigValidation(format!(
                    "delimiter must be a single ASCII character, got '{d}'"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
