//! Integration tests for the nokvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passwords are passed with `--password` / `NOKVAULT_PASSWORD` and
//! `--no-prompt` so nothing waits on a terminal.  Each test writes a
//! `.nokvault.toml` with cheap Argon2 settings into its working directory.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const FAST_CONFIG: &str = "[key_derivation]\nmemory_kib = 8192\niterations = 1\nparallelism = 1\n";

/// Helper: get a Command pointing at the nokvault binary, isolated from
/// the user's config and password environment.
fn nokvault(tmp: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("nokvault").expect("binary should exist");
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env("HOME", tmp.path())
        .env_remove("NOKVAULT_PASSWORD")
        .env_remove("NOKVAULT_NEW_PASSWORD")
        .env_remove("NOKVAULT_LOG");
    cmd
}

fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".nokvault.toml").write_str(FAST_CONFIG).unwrap();
    tmp
}

#[test]
fn help_flag_shows_usage() {
    let tmp = workspace();
    nokvault(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("password-protected containers"))
        .stdout(predicate::str::contains("encrypt"))
        .stdout(predicate::str::contains("decrypt"))
        .stdout(predicate::str::contains("rotate-key"))
        .stdout(predicate::str::contains("secure-delete"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("keyfile-generate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_flag_shows_version() {
    let tmp = workspace();
    nokvault(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nokvault"));
}

#[test]
fn no_args_shows_help() {
    let tmp = workspace();
    nokvault(&tmp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn encrypt_then_decrypt_file() {
    let tmp = workspace();
    let plain = tmp.child("hello.txt");
    plain.write_str("Hello, World!").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "correct-horse", "encrypt", "hello.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted"));
    tmp.child("hello.txt.nokvault").assert(predicate::path::is_file());

    std::fs::remove_file(plain.path()).unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "decrypt", "hello.txt.nokvault"])
        .env("NOKVAULT_PASSWORD", "correct-horse")
        .assert()
        .success();
    tmp.child("hello.txt").assert("Hello, World!");
}

#[test]
fn decrypt_with_wrong_password_fails_with_hint() {
    let tmp = workspace();
    tmp.child("hello.txt").write_str("Hello, World!").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "correct-horse", "encrypt", "hello.txt"])
        .assert()
        .success();

    nokvault(&tmp)
        .args([
            "--no-prompt",
            "--password",
            "wrong-password",
            "decrypt",
            "hello.txt.nokvault",
            "-o",
            "out.txt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decryption failed"));
    tmp.child("out.txt").assert(predicate::path::missing());
}

#[test]
fn missing_password_with_no_prompt_fails() {
    let tmp = workspace();
    tmp.child("a.txt").write_str("data").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "encrypt", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no password provided"));
    tmp.child("a.txt.nokvault").assert(predicate::path::missing());
}

#[test]
fn encrypt_missing_path_fails() {
    let tmp = workspace();
    nokvault(&tmp)
        .args(["--no-prompt", "--password", "pw", "encrypt", "ghost.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path does not exist"));
}

#[test]
fn directory_roundtrip_through_cli() {
    let tmp = workspace();
    tmp.child("docs/a.txt").write_str("alpha").unwrap();
    tmp.child("docs/sub/b.txt").write_str("bravo").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "pw", "encrypt", "docs", "-o", "vault"])
        .assert()
        .success();
    tmp.child("vault/a.txt.nokvault").assert(predicate::path::is_file());
    tmp.child("vault/sub/b.txt.nokvault").assert(predicate::path::is_file());

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "pw", "decrypt", "vault", "-o", "restored"])
        .assert()
        .success();
    tmp.child("restored/a.txt").assert("alpha");
    tmp.child("restored/sub/b.txt").assert("bravo");
}

#[test]
fn keyfile_roundtrip() {
    let tmp = workspace();
    tmp.child("a.txt").write_str("keyfile protected").unwrap();

    nokvault(&tmp)
        .args(["keyfile-generate", "my.key"])
        .assert()
        .success();
    tmp.child("my.key").assert(predicate::path::is_file());

    nokvault(&tmp)
        .args(["--no-prompt", "--keyfile", "my.key", "encrypt", "a.txt", "-o", "a.enc"])
        .assert()
        .success();
    nokvault(&tmp)
        .args(["--no-prompt", "--keyfile", "my.key", "decrypt", "a.enc", "-o", "a.out"])
        .assert()
        .success();
    tmp.child("a.out").assert("keyfile protected");
}

#[test]
fn rotate_key_through_cli() {
    let tmp = workspace();
    tmp.child("a.txt").write_str("rotating").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "old-pass", "encrypt", "a.txt"])
        .assert()
        .success();

    nokvault(&tmp)
        .args([
            "--no-prompt",
            "--password",
            "old-pass",
            "rotate-key",
            "a.txt.nokvault",
            "--new-password",
            "new-pass",
        ])
        .assert()
        .success();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "old-pass", "decrypt", "a.txt.nokvault", "-o", "x"])
        .assert()
        .failure();
    nokvault(&tmp)
        .args(["--no-prompt", "--password", "new-pass", "decrypt", "a.txt.nokvault", "-o", "y"])
        .assert()
        .success();
    tmp.child("y").assert("rotating");
}

#[test]
fn info_shows_header_fields() {
    let tmp = workspace();
    tmp.child("a.txt").write_str("data").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "--password", "pw", "encrypt", "a.txt"])
        .assert()
        .success();

    nokvault(&tmp)
        .args(["info", "a.txt.nokvault"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Salt"))
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("argon2id m=8192 KiB"));
}

#[test]
fn info_rejects_non_container() {
    let tmp = workspace();
    tmp.child("plain.txt")
        .write_str("this is just a text file with no header at all")
        .unwrap();

    nokvault(&tmp)
        .args(["info", "plain.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid file format"));
}

#[test]
fn secure_delete_requires_force_without_prompt() {
    let tmp = workspace();
    let doomed = tmp.child("doomed.txt");
    doomed.write_str("bye").unwrap();

    nokvault(&tmp)
        .args(["--no-prompt", "secure-delete", "doomed.txt"])
        .assert()
        .failure();
    doomed.assert(predicate::path::is_file());

    nokvault(&tmp)
        .args(["secure-delete", "doomed.txt", "--force", "--passes", "2"])
        .assert()
        .success();
    doomed.assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_show_lists_merged_settings() {
    let tmp = workspace();
    nokvault(&tmp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("key_derivation.memory_kib"))
        .stdout(predicate::str::contains("8192"))
        .stdout(predicate::str::contains("security.delete_passes"));
}

#[test]
fn config_get_prints_one_value() {
    let tmp = workspace();
    nokvault(&tmp)
        .args(["config", "--get", "key_derivation.iterations"])
        .assert()
        .success()
        .stdout("1\n");

    nokvault(&tmp)
        .args(["config", "--get", "delete_passes"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn config_get_unknown_key_fails() {
    let tmp = workspace();
    nokvault(&tmp)
        .args(["config", "--get", "no_such_key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_key"));
}

#[cfg(target_os = "linux")]
#[test]
fn config_init_writes_global_file_once() {
    let tmp = workspace();
    nokvault(&tmp)
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));

    let global = tmp.child("xdg/nokvault/config.toml");
    global.assert(predicate::str::contains("[key_derivation]"));

    // The local file still wins over the freshly written global defaults.
    nokvault(&tmp)
        .args(["config", "--get", "memory_kib"])
        .assert()
        .success()
        .stdout("8192\n");

    nokvault(&tmp)
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
