//! `rollcall run`, `rollcall new-entries` and `rollcall validate`.

use std::io::Write;
use std::path::PathBuf;

use rollcall_roster::config::RosterConfig;
use rollcall_roster::pipeline::{run_files, RunOutcome, RunReport};
use rollcall_roster::table::{read_table, write_table, write_table_to};
use rollcall_roster::{diff, RosterError};
use tracing::debug;

use crate::exit_codes::EXIT_IO;
use crate::util::render_preview;
use crate::{CliError, ColumnArgs};

/// Config file (if any) with command-line flags layered on top. Not yet validated.
fn resolve_config(columns: ColumnArgs) -> Result<RosterConfig, CliError> {
    let mut config = match columns.config {
        Some(ref path) => RosterConfig::read(path)?,
        None => RosterConfig::default(),
    };

    if let Some(key) = columns.key {
        config.comparison_column = key;
    }
    if let Some(old_key) = columns.old_key {
        config.old_file_comparison_column = Some(old_key);
    }
    if let Some(first) = columns.first_name {
        config.first_name_column = first;
    }
    if let Some(last) = columns.last_name {
        config.last_name_column = last;
    }
    if let Some(identifier) = columns.identifier {
        config.identifier_column = identifier;
    }
    if let Some(delimiter) = columns.delimiter {
        config.delimiter = Some(delimiter.to_string());
    }

    Ok(config)
}

// ============================================================================
// run
// ============================================================================

#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    old: PathBuf,
    new: PathBuf,
    domain: Option<String>,
    output: Option<PathBuf>,
    email_column: Option<String>,
    columns: ColumnArgs,
    json_output: bool,
    preview: usize,
) -> Result<(), CliError> {
    let mut config = resolve_config(columns)?;
    if let Some(domain) = domain {
        config.domain = domain;
    }
    if let Some(output) = output {
        config.output_path = output;
    }
    if let Some(email_column) = email_column {
        config.email_column = email_column;
    }
    config.validate()?;
    debug!(
        "run: old={} new={} output={} overrides={}",
        old.display(),
        new.display(),
        config.output_path.display(),
        config.overrides.len()
    );

    match run_files(&old, &new, &config)? {
        RunOutcome::NoNewEntries { old_rows, new_rows } => {
            if json_output {
                print_json(&serde_json::json!({
                    "status": "no_new_entries",
                    "old_rows": old_rows,
                    "new_rows": new_rows,
                }))?;
            }
            eprintln!("No new entries to process.");
            Ok(())
        }
        RunOutcome::Written(report) => {
            if json_output {
                print_json(&serde_json::json!({
                    "status": "written",
                    "summary": report.summary,
                }))?;
            } else {
                print_summary(&report, &config, preview)?;
            }
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: crate::exit_codes::EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    println!("{text}");
    Ok(())
}

fn print_summary(report: &RunReport, config: &RosterConfig, preview: usize) -> Result<(), CliError> {
    let s = &report.summary;
    eprintln!();
    eprintln!("=== Processing Summary ===");
    eprintln!("New entries processed: {}", s.new_entries);
    eprintln!("Emails generated: {}", s.emails_generated);
    if s.overrides_applied > 0 {
        eprintln!("Overrides applied: {}", s.overrides_applied);
    }
    eprintln!("Output file: {}", s.output);

    if preview == 0 {
        return Ok(());
    }

    let mut wanted: Vec<&str> = Vec::new();
    for col in [
        config.first_name_column.as_str(),
        config.last_name_column.as_str(),
        config.identifier_column.as_str(),
        config.email_column.as_str(),
    ] {
        if !wanted.contains(&col) {
            wanted.push(col);
        }
    }
    let text = render_preview(&report.table, &wanted, preview);
    if !text.is_empty() {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "\n=== Sample of processed entries ===")
            .and_then(|_| handle.write_all(text.as_bytes()))
            .map_err(|e| CliError { code: EXIT_IO, message: e.to_string(), hint: None })?;
    }
    Ok(())
}

// ============================================================================
// new-entries
// ============================================================================

pub fn cmd_new_entries(
    old: PathBuf,
    new: PathBuf,
    output: Option<PathBuf>,
    columns: ColumnArgs,
) -> Result<(), CliError> {
    let config = resolve_config(columns)?;
    config.validate_layout()?;

    let delimiter = config.delimiter_byte();
    let old_table = read_table(&old, delimiter)?;
    let new_table = read_table(&new, delimiter)?;

    let entries = diff(
        &old_table,
        &new_table,
        &config.comparison_column,
        Some(config.old_key_column()),
    )?;

    if entries.is_empty() {
        eprintln!("No new entries found.");
        return Ok(());
    }
    eprintln!("Found {} new entries.", entries.len());

    let out_delimiter = delimiter.unwrap_or(b',');
    match output {
        Some(path) => {
            write_table(&entries, &path, out_delimiter)?;
            eprintln!("New entries saved to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_table_to(&entries, stdout.lock(), out_delimiter)
                .map_err(|e| CliError::from(RosterError::io("<stdout>", e)))?;
        }
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    if !config_path.exists() {
        return Err(CliError::args(format!("config not found: {}", config_path.display()))
            .with_hint("usage: rollcall validate <CONFIG>"));
    }
    let config = RosterConfig::from_file(&config_path)?;
    eprintln!(
        "valid: domain '{}', key '{}' (old: '{}'), {} override(s), output {}",
        config.domain,
        config.comparison_column,
        config.old_key_column(),
        config.overrides.len(),
        config.output_path.display(),
    );
    Ok(())
}
