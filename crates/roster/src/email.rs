//! Email address derivation.
//!
//! An address is `<first><last><suffix>@<domain>` where the names are
//! lower-cased with spaces and periods removed and the suffix comes from the
//! identifier. A manual override table takes precedence; it is keyed on the
//! name/identifier triple as it appeared in the input, before any cleanup.

use std::collections::HashMap;

use serde::Serialize;

use crate::names::FixedNames;

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Lookup key for a manual override. Parts are stored trimmed but otherwise verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OverrideKey {
    pub first_name: String,
    pub last_name: String,
    pub identifier: String,
}

impl OverrideKey {
    pub fn new(first_name: &str, last_name: &str, identifier: &str) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            identifier: identifier.trim().to_string(),
        }
    }
}

impl std::fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.first_name, self.last_name, self.identifier)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: HashMap<OverrideKey, String>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous address if the key was already present.
    pub fn insert(&mut self, key: OverrideKey, email: impl Into<String>) -> Option<String> {
        self.entries.insert(key, email.into())
    }

    pub fn lookup(&self, first_name: &str, last_name: &str, identifier: &str) -> Option<&str> {
        self.entries
            .get(&OverrideKey::new(first_name, last_name, identifier))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(OverrideKey, String)> for OverrideTable {
    fn from_iter<T: IntoIterator<Item = (OverrideKey, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    Override,
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEmail {
    pub address: String,
    pub source: EmailSource,
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '.')
        .flat_map(char::to_lowercase)
        .collect()
}

/// `first + last`, lower-cased, spaces and periods removed.
pub fn local_part(first_name: &str, last_name: &str) -> String {
    let mut local = squash(first_name);
    local.push_str(&squash(last_name));
    local
}

fn last_two(s: &str) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(2)).collect()
}

/// Last two digits of the identifier. With fewer than two digits, falls back
/// to the last two characters of the identifier itself (`"EMP7"` → `"P7"`).
pub fn identifier_suffix(identifier: &str) -> String {
    let digits: String = identifier.chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 2 {
        last_two(&digits)
    } else {
        last_two(identifier)
    }
}

/// Steps shared by every non-override address.
pub fn derive_email(first_name: &str, last_name: &str, identifier: &str, domain: &str) -> String {
    format!(
        "{}{}@{}",
        local_part(first_name, last_name),
        identifier_suffix(identifier.trim()),
        domain
    )
}

/// Override lookup on the given names, otherwise [`derive_email`].
pub fn synthesize_email(
    first_name: &str,
    last_name: &str,
    identifier: &str,
    overrides: &OverrideTable,
    domain: &str,
) -> String {
    match overrides.lookup(first_name, last_name, identifier) {
        Some(email) => email.to_string(),
        None => derive_email(first_name, last_name, identifier, domain),
    }
}

/// Binds the override table and domain for one pipeline run.
///
/// Unlike [`synthesize_email`], the override lookup uses the raw cells while
/// derivation uses the cleaned names.
#[derive(Debug, Clone, Copy)]
pub struct EmailSynthesizer<'a> {
    overrides: &'a OverrideTable,
    domain: &'a str,
}

impl<'a> EmailSynthesizer<'a> {
    pub fn new(overrides: &'a OverrideTable, domain: &'a str) -> Self {
        Self { overrides, domain }
    }

    pub fn synthesize(&self, raw: &OverrideKey, fixed: &FixedNames) -> DerivedEmail {
        if let Some(email) =
            self.overrides
                .lookup(&raw.first_name, &raw.last_name, &raw.identifier)
        {
            return DerivedEmail {
                address: email.to_string(),
                source: EmailSource::Override,
            };
        }
        DerivedEmail {
            address: derive_email(&fixed.first, &fixed.last, &raw.identifier, self.domain),
            source: EmailSource::Derived,
        }
    }
}
