//! CLI integration tests for `dbup update`, `dbup plan` and `dbup ledger`
//! against a DuckDB-backed project in a temporary directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the compiled dbup binary (resolved at compile time)
fn dbup_bin() -> String {
    env!("CARGO_BIN_EXE_dbup").to_string()
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("auth.duckdb");
        std::fs::write(
            dir.path().join("dbup.yml"),
            format!(
                "source_directory: source
updates:
  enable_databases: 1
databases:
  auth:
    type: duckdb
    connection: '{}'
",
                database.display()
            ),
        )
        .unwrap();
        let project = Self { dir };
        project.write("sql/base/auth_database.sql", "CREATE TABLE account (id INTEGER);");
        std::fs::create_dir_all(project.updates_dir()).unwrap();
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn updates_dir(&self) -> PathBuf {
        self.root().join("source/sql/updates/auth")
    }

    fn write(&self, relative: &str, sql: &str) {
        let path = self.root().join("source").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, sql).unwrap();
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(dbup_bin())
            .arg("--project-dir")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run dbup")
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "dbup {args:?} failed.\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[test]
fn test_update_populates_and_records() {
    let project = Project::new();
    project.write(
        "sql/updates/auth/2024_01_01_00_auth.sql",
        "INSERT INTO account VALUES (1);",
    );

    let output = project.run(&["update", "--non-interactive"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "update failed.\nstderr: {stderr}");
    assert!(stderr.contains("Applied 1 query"), "stderr: {stderr}");

    let records = project.json(&["ledger", "-d", "auth", "-o", "json"]);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["path"], "2024_01_01_00_auth.sql");
    assert_eq!(records[0]["state"], "active");
}

#[test]
fn test_second_update_is_up_to_date() {
    let project = Project::new();
    project.write(
        "sql/updates/auth/2024_01_01_00_auth.sql",
        "INSERT INTO account VALUES (1);",
    );

    assert!(project.run(&["update", "--non-interactive"]).status.success());
    let output = project.run(&["update", "--non-interactive"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.contains("is up-to-date"), "stderr: {stderr}");
}

#[test]
fn test_plan_lists_pending_then_applied() {
    let project = Project::new();
    project.write(
        "sql/updates/auth/2024_01_01_00_auth.sql",
        "CREATE TABLE realmlist (id INTEGER);",
    );

    let plan = project.json(&["plan", "-o", "json"]);
    assert_eq!(plan["files"][0]["action"], "new");
    assert_eq!(plan["files"][0]["database"], "auth");

    assert!(project.run(&["update", "--non-interactive"]).status.success());

    let plan = project.json(&["plan", "-o", "json"]);
    assert_eq!(plan["files"][0]["action"], "applied");
    assert!(plan["dead_references"].as_array().unwrap().is_empty());
}

#[test]
fn test_failing_script_exits_non_zero() {
    let project = Project::new();
    project.write("sql/updates/auth/2024_01_01_00_auth.sql", "NOT VALID SQL;");

    let output = project.run(&["update", "--non-interactive"]);
    assert_eq!(output.status.code(), Some(1));

    let records = project.json(&["ledger", "-d", "auth", "-o", "json"]);
    assert!(records.as_array().unwrap().is_empty());
}

#[test]
fn test_missing_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(dbup_bin())
        .args(["update", "--project-dir"])
        .arg(dir.path())
        .output()
        .expect("Failed to run dbup");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dbup.yml"), "stderr: {stderr}");
}
