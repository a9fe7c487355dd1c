use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn hostswap(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hostswap").unwrap();
    cmd.env("HOSTSWAP_HOME", temp.path().join(".hostswap"))
        .env("HOSTSWAP_SYSTEM_HOSTS", system_hosts(temp))
        .env("VISUAL", "true")
        .env("EDITOR", "true")
        .env("NO_COLOR", "1")
        .env("HOSTSWAP_NO_FLUSH", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn system_hosts(temp: &TempDir) -> PathBuf {
    temp.path().join("etc").join("hosts")
}

fn fragment(temp: &TempDir, name: &str) -> PathBuf {
    temp.path()
        .join(".hostswap")
        .join("hosts")
        .join(format!("{name}.host"))
}

fn create(temp: &TempDir, name: &str, content: &str) {
    hostswap(temp)
        .args(["new", name, "--marker", "*", "--no-edit"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("New hosts file [{name}] created.")));
    fs::write(fragment(temp, name), content).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
#[serial]
fn test_help() {
    let temp = TempDir::new().unwrap();
    hostswap(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("change"))
        .stdout(predicate::str::contains("export"));
}

#[test]
#[serial]
fn test_first_run_creates_layout() {
    let temp = TempDir::new().unwrap();
    hostswap(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown hosts file."));

    let home = temp.path().join(".hostswap");
    assert!(home.join("registry.json").exists());
    assert!(home.join("hosts").join("global.host").exists());
}

#[test]
#[serial]
fn test_new_and_list() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");

    hostswap(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"));

    hostswap(&temp)
        .args(["new", "DEV", "--marker", "*", "--no-edit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
#[serial]
fn test_change_writes_system_hosts() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");
    fs::write(
        temp.path().join(".hostswap").join("hosts").join("global.host"),
        "127.0.0.1 localhost\n",
    )
    .unwrap();

    hostswap(&temp)
        .args(["change", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New hosts settings accepted."));

    let written = read(&system_hosts(&temp));
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[1], "# This file was automatically generated by hostswap");
    assert_eq!(lines[3], "# DEV Environment");
    let global_at = written.find("127.0.0.1 localhost").unwrap();
    let dev_at = written.find("10.0.0.1 api.dev").unwrap();
    assert!(global_at < dev_at);

    hostswap(&temp)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current hosts file is dev."));
}

#[test]
#[serial]
fn test_change_unknown_profile() {
    let temp = TempDir::new().unwrap();
    hostswap(&temp)
        .args(["change", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hosts file entry not found"));
}

#[test]
#[serial]
fn test_reset() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");
    hostswap(&temp).args(["change", "dev"]).assert().success();

    hostswap(&temp)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hosts file has been reset."));

    let written = read(&system_hosts(&temp));
    assert!(written.contains("# GLOBAL HOST FILE Environment"));
    assert!(!written.contains("api.dev"));
}

#[test]
#[serial]
fn test_remove_then_delete() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");

    hostswap(&temp)
        .args(["delete", "dev", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be removed"));

    hostswap(&temp).args(["remove", "dev"]).assert().success();

    hostswap(&temp)
        .args(["change", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hosts file is marked as deleted."));

    hostswap(&temp)
        .args(["delete", "dev", "--force"])
        .assert()
        .success();

    assert!(!fragment(&temp, "dev").exists());
    hostswap(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No hosts files found."));
}

#[test]
#[serial]
fn test_rename() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");

    hostswap(&temp)
        .args(["rename", "dev", "staging"])
        .assert()
        .success();

    assert!(!fragment(&temp, "dev").exists());
    assert_eq!(read(&fragment(&temp, "staging")), "10.0.0.1 api.dev\n");
}

#[test]
#[serial]
fn test_export_import_between_homes() {
    let source = TempDir::new().unwrap();
    create(&source, "dev", "10.0.0.1 api.dev\n");
    let package = source.path().join("dev.pkg");

    hostswap(&source)
        .arg("export")
        .arg(&package)
        .arg("dev")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1"));

    let target = TempDir::new().unwrap();
    fs::create_dir_all(fragment(&target, "dev").parent().unwrap()).unwrap();
    fs::write(fragment(&target, "dev"), "").unwrap();
    hostswap(&target)
        .arg("import")
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new"));

    assert_eq!(read(&fragment(&target, "dev")), "10.0.0.1 api.dev\n");
    hostswap(&target)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"));
}

#[test]
#[serial]
fn test_import_without_fragment_writes_content_only() {
    let source = TempDir::new().unwrap();
    create(&source, "dev", "10.0.0.1 api.dev\n");
    let package = source.path().join("dev.pkg");
    hostswap(&source)
        .arg("export")
        .arg(&package)
        .arg("dev")
        .assert()
        .success();

    let target = TempDir::new().unwrap();
    hostswap(&target)
        .arg("import")
        .arg(&package)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 new"));

    assert_eq!(read(&fragment(&target, "dev")), "10.0.0.1 api.dev\n");
    hostswap(&target)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No hosts files found."));
}

#[test]
#[serial]
fn test_import_corrupt_package() {
    let temp = TempDir::new().unwrap();
    let package = temp.path().join("bad.pkg");
    fs::write(&package, b"\x01").unwrap();

    hostswap(&temp)
        .arg("import")
        .arg(&package)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
#[serial]
fn test_import_rejects_global_fragment_path() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "10.0.0.1 api.dev\n");
    let global = temp.path().join(".hostswap").join("hosts").join("global.host");
    fs::write(&global, "127.0.0.1 localhost\n").unwrap();

    // "0.0.0.0 bank.example\n" encoded as base64
    let record = "evil~E~hosts/global.host~false~MC4wLjAuMCBiYW5rLmV4YW1wbGUK";
    let package = temp.path().join("evil.pkg");
    fs::write(&package, hostswap::codec::encode_package(record).unwrap()).unwrap();

    hostswap(&temp)
        .arg("import")
        .arg(&package)
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));

    assert_eq!(read(&global), "127.0.0.1 localhost\n");
}

#[test]
#[serial]
fn test_list_survives_non_utf8_fragment() {
    let temp = TempDir::new().unwrap();
    create(&temp, "dev", "");
    create(&temp, "qa", "10.0.0.2 qa\n");
    fs::write(fragment(&temp, "dev"), b"# caf\xe9\n").unwrap();

    hostswap(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("qa"));
    hostswap(&temp).args(["remove", "dev"]).assert().success();
    hostswap(&temp)
        .args(["delete", "dev", "--force"])
        .assert()
        .success();
}

#[test]
#[serial]
fn test_completions() {
    let temp = TempDir::new().unwrap();
    hostswap(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hostswap"));
}
