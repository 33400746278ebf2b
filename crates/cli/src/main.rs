// rollcall CLI - find new roster entries and derive their email addresses

mod exit_codes;
mod roster;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use exit_codes::{roster_exit_code, EXIT_SUCCESS, EXIT_USAGE};
use rollcall_roster::RosterError;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Find new entries between two roster snapshots and derive their email addresses")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Per-row narration (names before/after, each derived address)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors on stderr
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two snapshots, clean names of new entries and write them with an email column
    #[command(after_help = "\
Examples:
  rollcall run old.csv new.csv --domain uck.ac.in
  rollcall run old.csv new.csv --domain uck.ac.in --old-key 'Candidate code' -o out/new.csv
  rollcall run old.csv new.csv --config roster.toml
  rollcall run old.csv new.csv --config roster.toml --json")]
    Run {
        /// Previous roster snapshot
        old: PathBuf,

        /// Current roster snapshot
        new: PathBuf,

        /// Mail domain for derived addresses
        #[arg(long, env = "ROLLCALL_DOMAIN")]
        domain: Option<String>,

        /// Output file (default: processed_new_entries.csv)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Column the derived address is written to
        #[arg(long)]
        email_column: Option<String>,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Rows shown in the sample after a run (0 to disable)
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },

    /// Only list rows of the new snapshot whose key the old one lacks
    #[command(after_help = "\
Examples:
  rollcall new-entries old.csv new.csv
  rollcall new-entries old.csv new.csv --old-key 'Candidate code' -o new_only.csv")]
    NewEntries {
        /// Previous roster snapshot
        old: PathBuf,

        /// Current roster snapshot
        new: PathBuf,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        columns: ColumnArgs,
    },

    /// Validate a roster config without running
    #[command(after_help = "\
Examples:
  rollcall validate roster.toml")]
    Validate {
        /// Path to the roster .toml config file
        config: PathBuf,
    },
}

/// Options shared by commands that read both snapshots.
/// Each flag overrides the matching config file field.
#[derive(Args, Debug, Default)]
struct ColumnArgs {
    /// TOML config file (columns, domain, output, overrides)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Key column in the new snapshot
    #[arg(long)]
    key: Option<String>,

    /// Key column in the old snapshot (defaults to --key)
    #[arg(long)]
    old_key: Option<String>,

    /// First name column
    #[arg(long)]
    first_name: Option<String>,

    /// Last name column
    #[arg(long)]
    last_name: Option<String>,

    /// Identifier column the address suffix is taken from
    #[arg(long)]
    identifier: Option<String>,

    /// Field delimiter (sniffed from the input when omitted)
    #[arg(long)]
    delimiter: Option<char>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  rollcall-roster ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        None => {
            eprintln!("Usage: rollcall <command> [options]");
            eprintln!("       rollcall --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            old,
            new,
            domain,
            output,
            email_column,
            columns,
            json,
            preview,
        }) => roster::cmd_run(old, new, domain, output, email_column, columns, json, preview),
        Some(Commands::NewEntries { old, new, output, columns }) => {
            roster::cmd_new_entries(old, new, output, columns)
        }
        Some(Commands::Validate { config }) => roster::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<RosterError> for CliError {
    fn from(err: RosterError) -> Self {
        let hint = match &err {
            _ if err.is_schema() => {
                Some("column names are case-sensitive; set them with --key/--old-key/--first-name/--last-name/--identifier or in the config file".to_string())
            }
            RosterError::ConfigValidation(msg) if msg.contains("domain") => {
                Some("pass --domain, set ROLLCALL_DOMAIN, or add `domain = \"...\"` to the config".to_string())
            }
            _ => None,
        };
        Self { code: roster_exit_code(&err), message: err.to_string(), hint }
    }
}
