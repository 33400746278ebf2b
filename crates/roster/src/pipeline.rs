use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RosterConfig;
use crate::diff::diff;
use crate::email::{EmailSource, EmailSynthesizer, OverrideKey};
use crate::error::{RosterError, TableSide};
use crate::names::{normalize_names, FixedNames};
use crate::table::{read_table, write_table, Table};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of the in-memory stages.
#[derive(Debug, Clone)]
pub enum Reconciliation {
    /// Every key in the new snapshot already exists in the old one.
    NothingNew,
    Enriched(EnrichedTable),
}

#[derive(Debug, Clone)]
pub struct EnrichedTable {
    /// New entries with cleaned names and an email column.
    pub table: Table,
    pub overrides_applied: usize,
}

/// Outcome of a full run, including persistence.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    NoNewEntries { old_rows: usize, new_rows: usize },
    Written(RunReport),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: Table,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub old_rows: usize,
    pub new_rows: usize,
    pub new_entries: usize,
    pub emails_generated: usize,
    pub overrides_applied: usize,
    pub output: String,
    pub engine_version: String,
    pub run_at: String,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Copy of `table` with both name columns replaced by their cleaned forms.
pub fn fix_names(table: &Table, first_idx: usize, last_idx: usize) -> Table {
    let mut fixed = table.clone();
    for (i, row) in fixed.rows_mut().iter_mut().enumerate() {
        let before = (row.get(first_idx).to_string(), row.get(last_idx).to_string());
        let FixedNames { first, last } = normalize_names(row, first_idx, last_idx);
        debug!(
            "fixed names for row {i}: '{}' -> '{first}', '{}' -> '{last}'",
            before.0.trim(),
            before.1.trim()
        );
        row.set(first_idx, first);
        row.set(last_idx, last);
    }
    fixed
}

/// Column positions the email stage reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct EmailColumns {
    pub first: usize,
    pub last: usize,
    pub identifier: usize,
}

/// Copy of `fixed` carrying an address in `email_column` for every row.
///
/// `raw` is the same rows before name cleanup; overrides are matched against it.
/// Returns the table and the number of rows served by an override.
pub fn generate_emails(
    raw: &Table,
    fixed: &Table,
    cols: EmailColumns,
    email_column: &str,
    synth: &EmailSynthesizer<'_>,
) -> (Table, usize) {
    let (mut out, email_idx) = fixed.with_column(email_column);
    let mut overrides_applied = 0;

    for (i, (raw_row, row)) in raw.rows().iter().zip(out.rows_mut()).enumerate() {
        let key = OverrideKey::new(
            raw_row.get(cols.first),
            raw_row.get(cols.last),
            raw_row.get(cols.identifier),
        );
        let names = FixedNames {
            first: row.get(cols.first).to_string(),
            last: row.get(cols.last).to_string(),
        };
        let email = synth.synthesize(&key, &names);
        match email.source {
            EmailSource::Override => {
                overrides_applied += 1;
                info!("override for row {i}: {key} -> {}", email.address);
            }
            EmailSource::Derived => {
                debug!(
                    "generated email for row {i}: {} {} {} -> {}",
                    names.first, names.last, key.identifier, email.address
                );
            }
        }
        row.set(email_idx, email.address);
    }

    (out, overrides_applied)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Diff, clean names and derive addresses. No I/O.
pub fn reconcile(
    old: &Table,
    new: &Table,
    config: &RosterConfig,
) -> Result<Reconciliation, RosterError> {
    info!("step 1: finding new entries");
    let new_entries = diff(old, new, &config.comparison_column, Some(config.old_key_column()))?;

    if new_entries.is_empty() {
        warn!("no new entries found");
        return Ok(Reconciliation::NothingNew);
    }
    info!(
        "found {} new entries ({} old rows, {} new rows)",
        new_entries.len(),
        old.len(),
        new.len()
    );

    let cols = EmailColumns {
        first: new_entries.require_column(&config.first_name_column, TableSide::New)?,
        last: new_entries.require_column(&config.last_name_column, TableSide::New)?,
        identifier: new_entries.require_column(&config.identifier_column, TableSide::New)?,
    };

    info!("step 2: fixing and normalizing names");
    let fixed = fix_names(&new_entries, cols.first, cols.last);

    info!("step 3: generating email ids");
    let overrides = config.override_table();
    let synth = EmailSynthesizer::new(&overrides, config.domain.trim());
    let (table, overrides_applied) =
        generate_emails(&new_entries, &fixed, cols, &config.email_column, &synth);

    Ok(Reconciliation::Enriched(EnrichedTable {
        table,
        overrides_applied,
    }))
}

/// [`reconcile`], then write the enriched table to `config.output_path`.
/// Nothing is written when there are no new entries or any step fails.
pub fn run(old: &Table, new: &Table, config: &RosterConfig) -> Result<RunOutcome, RosterError> {
    let enriched = match reconcile(old, new, config)? {
        Reconciliation::NothingNew => {
            return Ok(RunOutcome::NoNewEntries {
                old_rows: old.len(),
                new_rows: new.len(),
            })
        }
        Reconciliation::Enriched(e) => e,
    };

    let output = config.output_path.display().to_string();
    info!("step 4: saving results to {output}");
    write_table(
        &enriched.table,
        &config.output_path,
        config.delimiter_byte().unwrap_or(b','),
    )?;

    let rows = enriched.table.len();
    info!("processing finished: {rows} new entries, {rows} emails, output {output}");

    Ok(RunOutcome::Written(RunReport {
        summary: RunSummary {
            old_rows: old.len(),
            new_rows: new.len(),
            new_entries: rows,
            emails_generated: rows,
            overrides_applied: enriched.overrides_applied,
            output,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        table: enriched.table,
    }))
}

/// Load both snapshots, then [`run`].
pub fn run_files(
    old_path: &Path,
    new_path: &Path,
    config: &RosterConfig,
) -> Result<RunOutcome, RosterError> {
    let delimiter = config.delimiter_byte();
    let old = read_table(old_path, delimiter)?;
    let new = read_table(new_path, delimiter)?;
    debug!(
        "loaded {} ({} rows) and {} ({} rows)",
        old_path.display(),
        old.len(),
        new_path.display(),
        new.len()
    );
    run(&old, &new, config)
}
