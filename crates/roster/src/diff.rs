// New-entry detection between two roster snapshots.
// Pure function: two tables in, the subset of the new table out.

use std::collections::HashSet;

use crate::error::{RosterError, TableSide};
use crate::table::Table;

/// Canonical form of a key cell: the trimmed text.
pub fn normalize_key(raw: &str) -> &str {
    raw.trim()
}

/// Rows of `new` whose trimmed key is absent from the trimmed keys of `old`.
///
/// `old_key` defaults to `new_key` when the snapshots share a column name.
/// Duplicate keys in `new` are each kept; duplicates in `old` collapse in the set.
pub fn diff(
    old: &Table,
    new: &Table,
    new_key: &str,
    old_key: Option<&str>,
) -> Result<Table, RosterError> {
    let old_key = old_key.unwrap_or(new_key);
    let old_idx = old.require_column(old_key, TableSide::Old)?;
    let new_idx = new.require_column(new_key, TableSide::New)?;

    let known: HashSet<&str> = old.column_values(old_idx).map(normalize_key).collect();

    Ok(new.filtered(|row| !known.contains(normalize_key(row.get(new_idx)))))
}
