// Roster tables and delimited-text import/export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RosterError, TableSide};

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// One record. Cells are kept as text, one per table column, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell at `idx`, or "" when the row is short.
    pub fn get(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, idx: usize, value: impl Into<String>) {
        if idx >= self.cells.len() {
            self.cells.resize(idx + 1, String::new());
        }
        self.cells[idx] = value.into();
    }

    /// Put `value` at `idx`, shifting any later cells right.
    fn insert(&mut self, idx: usize, value: impl Into<String>) {
        if idx > self.cells.len() {
            self.cells.resize(idx, String::new());
        }
        self.cells.insert(idx, value.into());
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// An ordered set of rows under a named header.
///
/// Stages never mutate a table they were handed; they derive a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from raw cell vectors, padding short rows to the header width.
    pub fn from_rows<I, R, S>(columns: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect());
        }
        table
    }

    /// Append a row. Short rows are padded; cells past the header are kept.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), String::new());
        }
        self.rows.push(Row::new(cells));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a schema error listing this table's columns.
    pub fn require_column(&self, name: &str, side: TableSide) -> Result<usize, RosterError> {
        self.column_index(name).ok_or_else(|| RosterError::MissingColumn {
            table: side,
            column: name.to_string(),
            available: self.columns.clone(),
        })
    }

    /// Cell value by row position and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r.get(idx))
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r.get(idx))
    }

    /// Copy of this table keeping only the rows `keep` accepts.
    pub fn filtered(&self, mut keep: impl FnMut(&Row) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Copy of this table guaranteed to carry `name`, plus that column's index.
    /// An absent column is appended and every existing row gets an empty cell
    /// in that position; cells past the old header move one to the right.
    pub fn with_column(&self, name: &str) -> (Table, usize) {
        let mut table = self.clone();
        if let Some(idx) = table.column_index(name) {
            return (table, idx);
        }
        let idx = table.columns.len();
        table.columns.push(name.to_string());
        for row in &mut table.rows {
            row.insert(idx, "");
        }
        (table, idx)
    }
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Read a delimited file with a header row. `delimiter = None` sniffs it.
pub fn read_table(path: &Path, delimiter: Option<u8>) -> Result<Table, RosterError> {
    let content = read_text(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    parse_table(&content, delimiter).map_err(|e| match e {
        RosterError::Io { message, .. } => RosterError::io(path.display().to_string(), message),
        other => other,
    })
}

/// Parse delimited text whose first record names the columns.
///
/// Short records are padded. A record with non-empty fields past the header
/// is rejected; trailing empty fields (a dangling delimiter) are dropped.
pub fn parse_table(content: &str, delimiter: u8) -> Result<Table, RosterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| RosterError::io("<input>", e))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let width = columns.len();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record.map_err(|e| RosterError::io("<input>", e))?;
        // Blank lines come through as a single empty field
        if record.len() == 1 && record.get(0).map_or(true, str::is_empty) {
            continue;
        }
        if record.iter().skip(width).any(|f| !f.is_empty()) {
            let line = record.position().map_or(0, |p| p.line());
            return Err(RosterError::io(
                "<input>",
                format!("line {line}: expected {width} fields, saw {}", record.len()),
            ));
        }
        table.push_row(record.iter().take(width).map(|f| f.to_string()).collect());
    }

    Ok(table)
}

/// Candidates in ascending precedence: on a tie the later one wins.
const DELIMITERS: [u8; 4] = [b'|', b'\t', b';', b','];

/// Data lines compared against the header when sniffing.
const SNIFF_LINES: usize = 8;

/// Pick the delimiter that splits the header into the most columns the data
/// lines agree with. Falls back to comma when nothing splits the header.
pub fn sniff_delimiter(content: &str) -> u8 {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let body: Vec<&str> = lines.take(SNIFF_LINES).collect();

    DELIMITERS
        .iter()
        .map(|&delim| {
            let width = field_count(header, delim);
            let agreeing = body.iter().filter(|l| field_count(l, delim) == width).count();
            (delim, width, agreeing)
        })
        .filter(|&(_, width, _)| width > 1)
        .max_by_key(|&(_, width, agreeing)| (agreeing, width))
        .map_or(b',', |(delim, _, _)| delim)
}

/// Fields on one physical line, ignoring delimiters inside double quotes.
fn field_count(line: &str, delim: u8) -> usize {
    let mut quoted = false;
    let mut fields = 1;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == delim && !quoted {
            fields += 1;
        }
    }
    fields
}

/// File contents as text. Bytes that are not valid UTF-8 are decoded as
/// Windows-1252, the usual encoding of spreadsheet exports on Windows.
fn read_text(path: &Path) -> Result<String, RosterError> {
    let bytes = std::fs::read(path).map_err(|e| RosterError::io(path.display().to_string(), e))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(text.into_owned())
        }
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write header + rows to `writer`. No index column.
///
/// Rows are written in full; cells past the header are never cut.
pub fn write_table_to<W: Write>(table: &Table, writer: W, delimiter: u8) -> Result<(), String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);

    wtr.write_record(table.columns()).map_err(|e| e.to_string())?;
    let width = table.columns().len();
    for row in table.rows() {
        let cells = row.cells();
        if cells.len() >= width {
            wtr.write_record(cells).map_err(|e| e.to_string())?;
        } else {
            let padded = (0..width).map(|i| row.get(i));
            wtr.write_record(padded).map_err(|e| e.to_string())?;
        }
    }
    wtr.flush().map_err(|e| e.to_string())
}

/// Write `table` to `path`, creating the containing directory first.
///
/// The rows go to a sibling `.tmp` file that is renamed over `path` only once
/// everything is flushed, so a failed write leaves `path` as it was.
pub fn write_table(table: &Table, path: &Path, delimiter: u8) -> Result<(), RosterError> {
    write_atomic(path, |file| write_table_to(table, file, delimiter))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic<F>(path: &Path, write: F) -> Result<(), RosterError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), String>,
{
    let label = path.display().to_string();
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| RosterError::io(&label, e))?;
        }
    }

    let tmp = tmp_path_for(path);
    let file = File::create(&tmp).map_err(|e| RosterError::io(&label, e))?;
    let mut out = BufWriter::new(file);
    let written = write(&mut out)
        .and_then(|()| out.into_inner().map_err(|e| e.error().to_string()))
        .and_then(|file| file.sync_all().map_err(|e| e.to_string()))
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| e.to_string()));

    if let Err(message) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(RosterError::io(label, message));
    }
    Ok(())
}
