// CLI-level tests driving the binary

use anyhow::Result;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

mod common;
use common::fixtures;

/// Helper to run the binary and parse its JSON output
fn run_command(args: &[&str], home: Option<&std::path::Path>) -> Result<(Value, i32, String)> {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fieldpilot"));
    cmd.args(args);
    if let Some(home) = home {
        cmd.env("HOME", home);
    }
    let output = cmd.output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    let json = serde_json::from_str(&stdout).unwrap_or_else(|_| {
        serde_json::json!({
            "error": exit_code != 0,
            "message": stdout.clone(),
            "exit_code": exit_code
        })
    });

    Ok((json, exit_code, stdout))
}

#[test]
fn test_version_command() -> Result<()> {
    let (_, exit_code, stdout) = run_command(&["version"], None)?;
    assert_eq!(exit_code, 0);
    assert!(stdout.contains("fieldpilot v"));
    Ok(())
}

#[test]
fn test_config_set_and_get() -> Result<()> {
    let home = TempDir::new()?;

    let (_, exit_code, _) = run_command(
        &["config", "set", "backend_url", "https://backend.example"],
        Some(home.path()),
    )?;
    assert_eq!(exit_code, 0);

    let (_, exit_code, stdout) = run_command(&["config", "get", "backend_url"], Some(home.path()))?;
    assert_eq!(exit_code, 0);
    assert_eq!(stdout.trim(), "https://backend.example");
    Ok(())
}

#[test]
fn test_config_show_defaults() -> Result<()> {
    let home = TempDir::new()?;

    let (_, exit_code, stdout) = run_command(&["config", "show"], Some(home.path()))?;
    assert_eq!(exit_code, 0);
    let settings: Value = serde_json::from_str(&stdout)?;
    assert_eq!(settings["backend_url"].as_str(), Some("https://claude.ai"));
    assert_eq!(settings["auto_detect"].as_bool(), Some(true));
    Ok(())
}

#[test]
fn test_config_rejects_unknown_key() -> Result<()> {
    let home = TempDir::new()?;

    let (result, exit_code, _) = run_command(
        &["config", "set", "no_such_key", "x"],
        Some(home.path()),
    )?;
    assert_eq!(exit_code, 1);
    assert_eq!(result["error"].as_bool(), Some(true));
    assert!(
        result["message"]
            .as_str()
            .unwrap_or_default()
            .contains("Unknown setting")
    );
    Ok(())
}

// Browser-backed tests. These need a WebDriver binary on PATH.

#[test]
#[ignore = "requires geckodriver"]
fn test_detect_finds_labeled_fields() -> Result<()> {
    let page = common::create_test_html(fixtures::LABELED_FORM);
    let url = format!("file://{}", page.display());

    let (result, exit_code, _) = run_command(&["detect", &url], None)?;
    assert_eq!(exit_code, 0);
    assert_eq!(result["count"].as_u64(), Some(2));
    Ok(())
}

#[test]
#[ignore = "requires geckodriver"]
fn test_infer_prefers_label() -> Result<()> {
    let page = common::create_test_html(fixtures::LABELED_FORM);
    let url = format!("file://{}", page.display());

    let (result, exit_code, _) = run_command(&["infer", &url, "#motivation"], None)?;
    assert_eq!(exit_code, 0);
    assert_eq!(
        result["question"].as_str(),
        Some("Why do you want to work here?")
    );
    assert_eq!(result["source"].as_str(), Some("label_for"));
    Ok(())
}

#[test]
#[ignore = "requires geckodriver"]
fn test_infer_falls_back_to_placeholder() -> Result<()> {
    let page = common::create_test_html(fixtures::UNLABELED_FORM);
    let url = format!("file://{}", page.display());

    let (result, exit_code, _) =
        run_command(&["infer", &url, "input[type='email']"], None)?;
    assert_eq!(exit_code, 0);
    assert_eq!(result["question"].as_str(), Some("Your email address"));
    assert_eq!(result["source"].as_str(), Some("placeholder"));
    Ok(())
}

#[test]
#[ignore = "requires geckodriver"]
fn test_insert_into_input() -> Result<()> {
    let page = common::create_test_html(fixtures::LABELED_FORM);
    let url = format!("file://{}", page.display());

    let (result, exit_code, _) =
        run_command(&["insert", &url, "#name", "Jane Doe"], None)?;
    assert_eq!(exit_code, 0);
    assert_eq!(result["inserted"].as_bool(), Some(true));
    Ok(())
}

#[test]
#[ignore = "requires geckodriver"]
fn test_insert_missing_field_exits_with_field_not_found() -> Result<()> {
    let page = common::create_test_html(fixtures::LABELED_FORM);
    let url = format!("file://{}", page.display());

    let (result, exit_code, _) =
        run_command(&["insert", &url, "#does-not-exist", "x"], None)?;
    assert_eq!(exit_code, 2);
    assert_eq!(result["error"].as_bool(), Some(true));
    Ok(())
}
