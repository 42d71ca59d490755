//! Integration tests for the wgkey CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords come from `WGKEY_PASSWORD` or piped stdin so nothing
//! prompts interactively, and every run is confined to a temp dir.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PROFILE_JSON: &str = r#"{
    "profile_name": "alice",
    "interface_name": "wg0",
    "peers": [{
        "name": "home",
        "key": "PEERPUBLICKEY=",
        "allowed_prefixes": "10.0.0.0/24",
        "endpoint": "vpn.example.com:51820"
    }]
}"#;

/// Helper: a wgkey command confined to `tmp`, with a fast KDF config.
fn wgkey(tmp: &TempDir) -> Command {
    let config = tmp.child("wgkey.toml");
    if !config.exists() {
        config
            .write_str("kdf = \"pbkdf2\"\npbkdf2_iterations = 10000\n")
            .unwrap();
    }

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("wgkey").expect("binary should exist");
    cmd.env("WIREGUARD_APP_HOME", tmp.path())
        .env_remove("WGKEY_PASSWORD")
        .env_remove("WGKEY_DATA_DIR")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config.path())
        .arg("--data-dir")
        .arg(tmp.path().join("profiles"));
    cmd
}

fn put_alice(tmp: &TempDir) {
    let key = tmp.child("alice.key");
    key.write_str("PRIVATEKEYDATA\n").unwrap();

    wgkey(tmp)
        .args(["put", "alice", "--key-file"])
        .arg(key.path())
        .env("WGKEY_PASSWORD", "correct-horse")
        .assert()
        .success()
        .stdout(predicate::str::contains("stored"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("wgkey")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Password-protected storage for WireGuard private keys",
        ))
        .stdout(predicate::str::contains("put"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("exists"))
        .stdout(predicate::str::contains("render"));
}

#[test]
fn no_args_shows_help() {
    Command::cargo_bin("wgkey")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn put_then_get_prints_key() {
    let tmp = TempDir::new().unwrap();
    put_alice(&tmp);

    wgkey(&tmp)
        .args(["get", "alice"])
        .env("WGKEY_PASSWORD", "correct-horse")
        .assert()
        .success()
        .stdout("PRIVATEKEYDATA\n");

    tmp.child("profiles/alice/secret.json")
        .assert(predicate::path::is_file());
}

#[test]
fn password_can_be_piped_on_stdin() {
    let tmp = TempDir::new().unwrap();
    put_alice(&tmp);

    wgkey(&tmp)
        .args(["get", "alice"])
        .write_stdin("correct-horse\n")
        .assert()
        .success()
        .stdout("PRIVATEKEYDATA\n");
}

#[test]
fn wrong_password_and_missing_look_the_same() {
    let tmp = TempDir::new().unwrap();
    put_alice(&tmp);

    let wrong = wgkey(&tmp)
        .args(["get", "alice"])
        .env("WGKEY_PASSWORD", "wrong")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot retrieve key"));

    let missing = wgkey(&tmp)
        .args(["get", "nobody"])
        .env("WGKEY_PASSWORD", "correct-horse")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot retrieve key"));

    assert_eq!(wrong.get_output().stderr, missing.get_output().stderr);
}

/// Stderr of a failing `get <profile>`, checked to be the single generic line.
fn failed_get_stderr(tmp: &TempDir, profile: &str) -> Vec<u8> {
    let output = wgkey(tmp)
        .args(["get", profile])
        .env("WGKEY_PASSWORD", "correct-horse")
        .assert()
        .failure()
        .stdout("")
        .get_output()
        .stderr
        .clone();

    let text = String::from_utf8(output.clone()).unwrap();
    assert_eq!(text.lines().count(), 1, "unexpected stderr: {text}");
    assert!(
        text.trim_end().ends_with("cannot retrieve key"),
        "unexpected stderr: {text}"
    );
    output
}

#[test]
fn every_retrieval_failure_prints_the_same_message() {
    let tmp = TempDir::new().unwrap();
    let missing = failed_get_stderr(&tmp, "alice");

    put_alice(&tmp);
    let secret = tmp.child("profiles/alice/secret.json");
    let original = std::fs::read_to_string(secret.path()).unwrap();

    // Not JSON at all.
    secret.write_str("{ definitely not json").unwrap();
    assert_eq!(failed_get_stderr(&tmp, "alice"), missing);

    // Cost parameters scrypt itself refuses.
    let mut json: serde_json::Value = serde_json::from_str(&original).unwrap();
    json["kdf"] = "scrypt".into();
    json["n"] = (1u64 << 20).into();
    json["r"] = 1.into();
    json["p"] = 1.into();
    secret.write_str(&json.to_string()).unwrap();
    assert_eq!(failed_get_stderr(&tmp, "alice"), missing);

    // Parallelism far beyond any sane bound.
    json["n"] = 2.into();
    json["p"] = ((1u64 << 30) - 1).into();
    secret.write_str(&json.to_string()).unwrap();
    assert_eq!(failed_get_stderr(&tmp, "alice"), missing);

    // A path that exists but cannot be read as a file.
    std::fs::remove_file(secret.path()).unwrap();
    std::fs::create_dir(secret.path()).unwrap();
    assert_eq!(failed_get_stderr(&tmp, "alice"), missing);
}

#[test]
fn exists_reflects_lifecycle() {
    let tmp = TempDir::new().unwrap();

    wgkey(&tmp)
        .args(["exists", "alice"])
        .assert()
        .failure()
        .stdout("no\n");

    put_alice(&tmp);

    wgkey(&tmp)
        .args(["exists", "alice"])
        .assert()
        .success()
        .stdout("yes\n");

    wgkey(&tmp)
        .args(["delete", "alice", "--force"])
        .assert()
        .success();

    wgkey(&tmp)
        .args(["exists", "alice"])
        .assert()
        .failure();
}

#[test]
fn delete_of_unknown_profile_succeeds() {
    let tmp = TempDir::new().unwrap();
    wgkey(&tmp)
        .args(["delete", "ghost", "--force"])
        .assert()
        .success();
}

#[test]
fn invalid_profile_id_is_reported() {
    let tmp = TempDir::new().unwrap();
    wgkey(&tmp)
        .args(["delete", "../etc", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid profile id"));
}

#[test]
fn list_shows_stored_profiles() {
    let tmp = TempDir::new().unwrap();
    put_alice(&tmp);

    wgkey(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("pbkdf2"));
}

#[test]
fn render_uses_stored_key() {
    let tmp = TempDir::new().unwrap();
    put_alice(&tmp);
    let profile = tmp.child("alice.json");
    profile.write_str(PROFILE_JSON).unwrap();

    wgkey(&tmp)
        .args(["render", "alice", "--profile-file"])
        .arg(profile.path())
        .env("WGKEY_PASSWORD", "correct-horse")
        .assert()
        .success()
        .stdout(predicate::str::contains("PrivateKey = PRIVATEKEYDATA"))
        .stdout(predicate::str::contains("PublicKey = PEERPUBLICKEY="))
        .stdout(predicate::str::contains("#Name = home"));
}

#[test]
fn weak_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    tmp.child("wgkey.toml")
        .write_str("kdf = \"pbkdf2\"\npbkdf2_iterations = 10\n")
        .unwrap();

    wgkey(&tmp)
        .args(["exists", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pbkdf2_iterations"));
}

#[test]
fn completions_reject_unknown_shell() {
    Command::cargo_bin("wgkey")
        .unwrap()
        .args(["completions", "csh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn completions_for_bash() {
    Command::cargo_bin("wgkey")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wgkey"));
}
