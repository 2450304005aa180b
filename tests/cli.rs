use assert_cmd::Command;
use predicates::prelude::*;

fn shopsync(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("shopsync").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    shopsync(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("documents"))
        .stdout(predicate::str::contains("pending"));
}

#[test]
fn test_status_without_database() {
    let home = tempfile::tempdir().unwrap();
    shopsync(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
}

#[test]
fn test_sync_requires_init() {
    let home = tempfile::tempdir().unwrap();
    shopsync(home.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("shopsync init"));
}

#[test]
fn test_documents_requires_shop_ids() {
    let home = tempfile::tempdir().unwrap();
    shopsync(home.path()).arg("documents").assert().failure();
}

#[test]
fn test_init_then_inspect() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");

    shopsync(home.path())
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("shopsync.db"));
    assert!(data_dir.join("shopsync.db").exists());
    assert!(home.path().join(".config/shopsync/settings.json").exists());

    shopsync(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("(never synced)"))
        .stdout(predicate::str::contains("Pending docs:  0"));

    shopsync(home.path())
        .arg("mappings")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shareholder Code"));

    shopsync(home.path())
        .args(["mappings", "--shop", "2001"])
        .assert()
        .success();

    shopsync(home.path())
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("Failures"));
}
