use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("scs-migration-checker").unwrap();
    cmd.env_remove("PASSWORD").env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_prints_build_metadata() {
    cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")))
        .stdout(contains(", commit "))
        .stdout(contains("built at"));
}

#[test]
fn version_needs_no_credentials() {
    cmd().args(["--api", "", "version"]).assert().success();
}

#[test]
fn scan_without_credentials_fails() {
    cmd()
        .args(["--api", "https://api.sys.example.com", "--user", "admin"])
        .assert()
        .failure()
        .stderr(contains("the api, user, and password flags are required, please try again"));
}

#[test]
fn empty_password_from_env_is_rejected() {
    cmd()
        .args(["--api", "https://api.sys.example.com", "--user", "admin", "scan"])
        .env("PASSWORD", "")
        .assert()
        .failure()
        .stderr(contains("flags are required"));
}

#[test]
fn migrate_requires_target() {
    cmd()
        .args(["migrate", "--org", "payments"])
        .assert()
        .failure()
        .stderr(contains("--space"));
}
