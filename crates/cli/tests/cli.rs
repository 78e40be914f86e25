use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the user's config, cache and lock state.
fn precache(temp: &Path) -> Command {
    let config = temp.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }

    let mut cmd = Command::cargo_bin("precache").unwrap();
    cmd.env("PRECACHE_CONFIG", &config)
        .env("PRECACHE_CACHE_DIR", temp.join("cache"))
        .env("PRECACHE_ENGINE_VERSION", "1.0.0")
        .env_remove("PRECACHE_CHANNEL")
        .env_remove("PRECACHE_STORAGE_BASE_URL")
        .env_remove("FLUTTER_ALREADY_LOCKED")
        .env_remove("RUST_LOG");
    cmd
}

fn seed_stamp(temp: &Path, artifact: &str, version: &str) {
    let stamps = temp.join("cache").join("stamps");
    fs::create_dir_all(&stamps).unwrap();
    fs::write(stamps.join(format!("{artifact}.stamp")), version).unwrap();
}

/// Artifacts a bare invocation requires on the stable channel.
const DEFAULT_REQUIRED: [&str; 5] = [
    "android_gen_snapshot",
    "android_internal_build",
    "android_maven",
    "ios",
    "universal",
];

fn seed_defaults(temp: &Path, version: &str) {
    for artifact in DEFAULT_REQUIRED {
        seed_stamp(temp, artifact, version);
    }
}

#[test]
fn test_umbrella_negation_with_child_is_usage_error() {
    let temp = TempDir::new().unwrap();
    precache(temp.path())
        .args(["--no-android", "--android_maven"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--android_maven requires --android"));

    // Nothing was touched.
    assert!(!temp.path().join("cache").exists());
}

#[test]
fn test_conflict_json_envelope() {
    let temp = TempDir::new().unwrap();
    precache(temp.path())
        .args(["--json", "--android_gen_snapshot", "--no-android"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""status":"error""#))
        .stdout(predicate::str::contains(
            "--android_gen_snapshot requires --android",
        ));
}

#[test]
fn test_already_up_to_date() {
    let temp = TempDir::new().unwrap();
    seed_defaults(temp.path(), "1.0.0");
    // A platform fetched by an older engine and no longer requested.
    seed_stamp(temp.path(), "web", "0.9.0");

    precache(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up-to-date."));

    precache(temp.path())
        .args(["--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome":"up_to_date""#));
}

#[test]
fn test_already_locked_skips_lock_file() {
    let temp = TempDir::new().unwrap();
    seed_defaults(temp.path(), "1.0.0");

    precache(temp.path())
        .env("FLUTTER_ALREADY_LOCKED", "true")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up-to-date."));

    assert!(!temp.path().join("cache").join("lockfile").exists());
}

#[test]
fn test_stale_stamp_triggers_update_failure() {
    let temp = TempDir::new().unwrap();
    seed_stamp(temp.path(), "universal", "0.9.0");

    // Nothing listens on port 9, so the download fails.
    precache(temp.path())
        .env("PRECACHE_STORAGE_BASE_URL", "http://127.0.0.1:9")
        .args(["--no-android", "--no-ios"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Update failed"));
}

#[test]
fn test_missing_engine_version_is_config_error() {
    let temp = TempDir::new().unwrap();
    precache(temp.path())
        .env_remove("PRECACHE_ENGINE_VERSION")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No engine version configured"));
}

#[test]
fn test_malformed_config_is_config_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), "channel = [").unwrap();

    precache(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_help_hides_internal_flags() {
    let temp = TempDir::new().unwrap();
    precache(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--all-platforms"))
        .stdout(predicate::str::contains("--android_maven"))
        .stdout(predicate::str::contains("--flutter_runner").not())
        .stdout(predicate::str::contains("--use-unsigned-mac-binaries").not());
}
