// End-to-end checks of the non-interactive command paths
//
// Each test points OMNI_HOME at a scratch directory so the user's real
// config is never touched.

use omni::config::{ConfigStore, CONFIG_DIR_ENV};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn omni(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_omni"))
        .args(args)
        .env(CONFIG_DIR_ENV, home)
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run omni")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_query_refuses_when_unconfigured() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("omni");

    let output = omni(&home, &["query"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Please run \"omni config\" to set up."));
}

#[test]
fn test_default_command_refuses_half_finished_setup() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("omni");
    let store = ConfigStore::at(&home);
    store.init().unwrap();
    store
        .update_initialization_state("model_selection", false, None)
        .unwrap();

    let output = omni(&home, &["--name", "Ada"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(!out.contains("Hello, Ada"));
    assert!(out.contains("not configured"));
}

#[test]
fn test_query_reports_broken_config() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("omni");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::write(home.join("config.json"), "{ not json").unwrap();

    let output = omni(&home, &["query"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to parse config file"));
}

#[test]
fn test_reset_without_config() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("omni");

    let output = omni(&home, &["config:reset"]);
    assert!(output.status.success());
    assert!(stdout(&output)
        .contains("No configuration found. Run \"omni config\" to start the setup process."));
    assert!(!home.join("config.json").exists());
}

#[test]
fn test_reset_clears_progress_but_keeps_keys() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("omni");
    let store = ConfigStore::at(&home);
    store.init().unwrap();
    store.update_provider_api_key("openai", "sk-keep").unwrap();
    store
        .update_initialization_state("completion", true, None)
        .unwrap();

    let output = omni(&home, &["config:reset"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Configuration process has been reset."));

    assert!(!store.is_initialization_completed().unwrap());
    assert_eq!(store.current_initialization_step().unwrap(), "welcome");
    assert_eq!(
        store.read().unwrap().providers["openai"].api_key(),
        Some("sk-keep")
    );
}
