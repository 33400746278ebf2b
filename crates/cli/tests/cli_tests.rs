// End-to-end tests for the `rollcall` binary: exit codes, written files,
// and the --json stdout contract.
//
// Run with: cargo test -p rollcall-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn rollcall() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rollcall"));
    cmd.env_remove("ROLLCALL_DOMAIN");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

const OLD_CSV: &str = "Candidate code,Name\nA1,Sue Park\nA2,Raj Iyer\n";
const NEW_CSV: &str = "\
Employee ID,First Name [Required],Last Name
A1,Sue,Park
A3,Mark,O.Brien
ID12345, j.w. ,van.der  Berg
";

fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let old = write(dir.path(), "old.csv", OLD_CSV);
    let new = write(dir.path(), "new.csv", NEW_CSV);
    (dir, old, new)
}

// ===========================================================================
// rollcall run
// ===========================================================================

#[test]
fn run_writes_output_and_prints_sample() {
    let (dir, old, new) = setup();
    let out_path = dir.path().join("results/processed.csv");

    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .args(["--domain", "uck.ac.in", "--old-key", "Candidate code"])
        .arg("-o")
        .arg(&out_path)
        .output()
        .expect("rollcall run");

    assert!(out.status.success(), "exit: {:?}\nstderr: {}", out.status, stderr(&out));

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(
        written,
        "Employee ID,First Name [Required],Last Name,Email\n\
         A3,Mark,O Brien,markobrienA3@uck.ac.in\n\
         ID12345,Jw,van der Berg,jwvanderberg45@uck.ac.in\n"
    );

    let err = stderr(&out);
    assert!(err.contains("New entries processed: 2"), "stderr: {err}");
    assert!(err.contains("Emails generated: 2"), "stderr: {err}");

    let sample = stdout(&out);
    assert!(sample.contains("=== Sample of processed entries ==="));
    assert!(sample.contains("markobrienA3@uck.ac.in"));
}

#[test]
fn run_json_is_single_value() {
    let (dir, old, new) = setup();
    let out_path = dir.path().join("out.csv");

    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .args(["--domain", "uck.ac.in", "--old-key", "Candidate code", "--json"])
        .arg("--output")
        .arg(&out_path)
        .output()
        .expect("rollcall run --json");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let val: serde_json::Value = serde_json::from_str(stdout(&out).trim())
        .unwrap_or_else(|e| panic!("stdout must be JSON: {e}\n{}", stdout(&out)));
    assert_eq!(val["status"], "written");
    assert_eq!(val["summary"]["new_entries"], 2);
    assert_eq!(val["summary"]["emails_generated"], 2);
    assert_eq!(val["summary"]["old_rows"], 2);
    assert_eq!(val["summary"]["new_rows"], 3);
}

#[test]
fn run_with_config_file_and_override() {
    let (dir, old, new) = setup();
    let out_path = dir.path().join("from_config.csv");
    let config = write(
        dir.path(),
        "roster.toml",
        &format!(
            r#"
domain = "uck.ac.in"
old_file_comparison_column = "Candidate code"
output_path = "{}"

[[overrides]]
first_name = "Mark"
last_name = "O.Brien"
identifier = "A3"
email = "mark.obrien@uck.ac.in"
"#,
            out_path.display()
        ),
    );

    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .arg("--config")
        .arg(&config)
        .args(["--preview", "0"])
        .output()
        .expect("rollcall run --config");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).is_empty());
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("A3,Mark,O Brien,mark.obrien@uck.ac.in\n"));
    assert!(stderr(&out).contains("Overrides applied: 1"));
}

#[test]
fn run_without_new_entries_exits_zero_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let old = write(dir.path(), "old.csv", "Employee ID\nA1\nA3\nID12345\n");
    let new = write(dir.path(), "new.csv", NEW_CSV);
    let out_path = dir.path().join("never.csv");

    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .args(["--domain", "x.edu"])
        .arg("-o")
        .arg(&out_path)
        .output()
        .expect("rollcall run");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("No new entries"));
    assert!(!out_path.exists());
}

#[test]
fn run_missing_column_exits_schema_error() {
    let (dir, old, new) = setup();
    let out_path = dir.path().join("never.csv");

    // Old file has no "Employee ID" column
    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .args(["--domain", "x.edu"])
        .arg("-o")
        .arg(&out_path)
        .output()
        .expect("rollcall run");

    assert_eq!(out.status.code(), Some(3), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("column 'Employee ID' not found in old file"), "stderr: {err}");
    assert!(err.contains("'Candidate code'"), "stderr: {err}");
    assert!(err.contains("hint:  column names are case-sensitive"), "stderr: {err}");
    assert!(!out_path.exists());
}

#[test]
fn run_missing_input_exits_io_error() {
    let (dir, old, _new) = setup();
    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(dir.path().join("nope.csv"))
        .args(["--domain", "x.edu"])
        .output()
        .expect("rollcall run");

    assert_eq!(out.status.code(), Some(4), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("nope.csv"));
}

#[test]
fn run_without_domain_is_config_error() {
    let (_dir, old, new) = setup();
    let out = rollcall()
        .arg("run")
        .arg(&old)
        .arg(&new)
        .output()
        .expect("rollcall run");

    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr(&out));
    let err = stderr(&out);
    assert!(err.contains("domain is required"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

// ===========================================================================
// rollcall new-entries
// ===========================================================================

#[test]
fn new_entries_to_stdout() {
    let (_dir, old, new) = setup();
    let out = rollcall()
        .arg("new-entries")
        .arg(&old)
        .arg(&new)
        .args(["--old-key", "Candidate code"])
        .output()
        .expect("rollcall new-entries");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "Employee ID,First Name [Required],Last Name\n\
         A3,Mark,O.Brien\n\
         ID12345, j.w. ,van.der  Berg\n"
    );
    assert!(stderr(&out).contains("Found 2 new entries."));
}

#[test]
fn new_entries_to_file() {
    let (dir, old, new) = setup();
    let out_path = dir.path().join("sub/new_only.csv");
    let out = rollcall()
        .arg("new-entries")
        .arg(&old)
        .arg(&new)
        .args(["--old-key", "Candidate code", "-o"])
        .arg(&out_path)
        .output()
        .expect("rollcall new-entries");

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let written = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(written.lines().count(), 3);
}

#[test]
fn new_entries_none_found() {
    let dir = tempfile::tempdir().unwrap();
    let old = write(dir.path(), "old.csv", NEW_CSV);
    let new = write(dir.path(), "new.csv", NEW_CSV);
    let out = rollcall()
        .arg("new-entries")
        .arg(&old)
        .arg(&new)
        .output()
        .expect("rollcall new-entries");

    assert!(out.status.success());
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("No new entries found."));
}

// ===========================================================================
// rollcall validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "ok.toml", "domain = \"uck.ac.in\"\n");
    let out = rollcall().arg("validate").arg(&config).output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: domain 'uck.ac.in'"));
}

#[test]
fn validate_rejects_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "bad.toml", "domain = \"x.edu\"\ndelimiter = \"::\"\n");
    let out = rollcall().arg("validate").arg(&config).output().unwrap();
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("delimiter"));
}

#[test]
fn validate_missing_file_is_usage_error() {
    let out = rollcall()
        .args(["validate", "/nonexistent/roster.toml"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
}
