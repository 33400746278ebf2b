//! Name cleanup applied to every new roster entry before an address is derived.

use crate::table::Row;

/// Cleaned first/last name pair for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedNames {
    pub first: String,
    pub last: String,
}

/// First name: drop spaces and periods, then capitalize the whole remainder
/// as one word (`" j.w. "` → `"Jw"`).
pub fn fix_first_name(raw: &str) -> String {
    let compact: String = raw.trim().chars().filter(|c| *c != ' ' && *c != '.').collect();
    capitalize(&compact)
}

/// Last name: periods become spaces, whitespace runs collapse to one space.
/// Casing is left alone (`"van.der  Berg"` → `"van der Berg"`).
pub fn fix_last_name(raw: &str) -> String {
    raw.trim()
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Read the two name cells of `row` and return their cleaned forms.
/// The row itself is not modified.
pub fn normalize_names(row: &Row, first_idx: usize, last_idx: usize) -> FixedNames {
    FixedNames {
        first: fix_first_name(row.get(first_idx)),
        last: fix_last_name(row.get(last_idx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_examples() {
        assert_eq!(fix_first_name(" j.w. "), "Jw");
        assert_eq!(fix_first_name("MARY ANN"), "Maryann");
        assert_eq!(fix_first_name("o'neil"), "O'neil");
        assert_eq!(fix_first_name("   "), "");
        assert_eq!(fix_first_name(""), "");
    }

    #[test]
    fn last_name_examples() {
        assert_eq!(fix_last_name("van.der  Berg"), "van der Berg");
        assert_eq!(fix_last_name("O.Brien"), "O Brien");
        assert_eq!(fix_last_name("  Smith\t Jones "), "Smith Jones");
        assert_eq!(fix_last_name("..."), "");
        assert_eq!(fix_last_name("McDONALD"), "McDONALD");
    }

    #[test]
    fn normalize_reads_row_without_mutating() {
        let row = Row::new(vec![" j.w. ".into(), "van.der  Berg".into(), "X1".into()]);
        let before = row.clone();
        let fixed = normalize_names(&row, 0, 1);
        assert_eq!(
            fixed,
            FixedNames {
                first: "Jw".into(),
                last: "van der Berg".into()
            }
        );
        assert_eq!(row, before);
        // Deterministic
        assert_eq!(normalize_names(&row, 0, 1), fixed);
    }

    #[test]
    fn short_row_normalizes_to_empty() {
        let row = Row::new(vec!["Ann".into()]);
        let fixed = normalize_names(&row, 0, 3);
        assert_eq!(fixed.first, "Ann");
        assert_eq!(fixed.last, "");
    }
}
