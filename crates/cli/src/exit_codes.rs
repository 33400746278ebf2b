//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success, including "no new entries"                  |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Schema error: a configured column is missing         |
//! | 4    | I/O error: input unreadable or output unwritable     |
//! | 5    | Invalid config file or option combination            |

use rollcall_roster::RosterError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// A key, name or identifier column is absent from an input table.
pub const EXIT_SCHEMA: u8 = 3;

/// Input table unreadable or output destination unwritable.
pub const EXIT_IO: u8 = 4;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

/// Map an engine error to its exit code.
pub fn roster_exit_code(err: &RosterError) -> u8 {
    match err {
        RosterError::ConfigParse(_) | RosterError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        RosterError::MissingColumn { .. } => EXIT_SCHEMA,
        RosterError::Io { .. } => EXIT_IO,
    }
}
