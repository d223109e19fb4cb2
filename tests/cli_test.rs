//! Integration tests for CLI argument parsing.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use reprise::engine::Engine;
use reprise::input::TraceInput;
use reprise::step::Step;

fn reprise_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin("reprise"));
    cmd.env_remove("REPRISE_DATA_DIR");
    cmd.env_remove("REPRISE_MARKET_URL");
    cmd.env_remove("REPRISE_MARKET_TOKEN");
    cmd
}

fn seed_component(data_dir: &std::path::Path, name: &str, steps: Vec<Step>) {
    let mut engine = Engine::open(data_dir, TraceInput::new()).unwrap();
    engine.save_component(name, steps).unwrap();
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = reprise_cmd();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Desktop macro engine"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = reprise_cmd();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_no_args_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = reprise_cmd();
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_invalid_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = reprise_cmd();
    cmd.arg("invalid-command");
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_list_empty_store() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.arg("list").arg("--data-dir").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Nothing stored yet"));
    Ok(())
}

#[test]
fn cli_list_shows_stored_items() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_component(temp.path(), "fill-form", vec![Step::SelectAll, Step::Paste]);

    let mut cmd = reprise_cmd();
    cmd.arg("list").arg("--data-dir").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fill-form"))
        .stdout(predicate::str::contains("2 steps"));
    Ok(())
}

#[test]
fn cli_list_json_output() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_component(temp.path(), "fill-form", vec![Step::Copy]);

    let mut cmd = reprise_cmd();
    cmd.args(["list", "--json", "--data-dir"]).arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"components\""))
        .stdout(predicate::str::contains("\"fill-form\""));
    Ok(())
}

#[test]
fn cli_run_unknown_assembly_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["run", "missing", "--data-dir"]).arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown assembly"));
    Ok(())
}

#[test]
fn cli_run_component_replays_against_the_trace_backend(
) -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_component(temp.path(), "greet", vec![Step::EnterText("hello".into())]);

    let mut cmd = reprise_cmd();
    cmd.args(["run", "greet", "--component", "--data-dir"])
        .arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1 steps run"));
    Ok(())
}

#[test]
fn cli_delete_missing_item_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["delete", "component", "missing", "--data-dir"])
        .arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No component named 'missing'"));
    Ok(())
}

#[test]
fn cli_delete_removes_the_item() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seed_component(temp.path(), "fill", vec![Step::Copy]);

    let mut cmd = reprise_cmd();
    cmd.args(["delete", "component", "fill", "--data-dir"])
        .arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Deleted component 'fill'"));

    let engine = Engine::open(temp.path(), TraceInput::new()).unwrap();
    assert!(!engine.components().contains("fill"));
    Ok(())
}

#[test]
fn cli_export_then_import_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let source = TempDir::new()?;
    seed_component(
        source.path(),
        "fill",
        vec![Step::EnterText("hello {i}".into())],
    );
    let archive = source.path().join("fill.zip");

    let mut cmd = reprise_cmd();
    cmd.args(["export", "component", "fill", "--out"])
        .arg(&archive)
        .arg("--data-dir")
        .arg(source.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Exported component 'fill'"));
    assert!(archive.exists());

    let target = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["import", "component"])
        .arg(&archive)
        .arg("--data-dir")
        .arg(target.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Imported component 'fill'"));

    let engine = Engine::open(target.path(), TraceInput::new()).unwrap();
    assert_eq!(
        engine.components().get("fill"),
        Some(&[Step::EnterText("hello {i}".into())][..])
    );
    Ok(())
}

#[test]
fn cli_import_renames_the_item() -> Result<(), Box<dyn std::error::Error>> {
    let source = TempDir::new()?;
    seed_component(source.path(), "fill", vec![Step::Copy]);
    let archive = source.path().join("fill.zip");

    let mut cmd = reprise_cmd();
    cmd.args(["export", "component", "fill", "--out"])
        .arg(&archive)
        .arg("--data-dir")
        .arg(source.path());
    cmd.assert().success();

    let mut cmd = reprise_cmd();
    cmd.args(["import", "component"])
        .arg(&archive)
        .args(["--rename", "weekly-fill", "--data-dir"])
        .arg(source.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("weekly-fill"));
    Ok(())
}

#[test]
fn cli_import_missing_archive_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["import", "component"])
        .arg(temp.path().join("nope.zip"))
        .arg("--data-dir")
        .arg(temp.path());
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_export_unknown_item_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["export", "assembly", "missing", "--data-dir"])
        .arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown assembly"));
    Ok(())
}

#[test]
fn cli_market_points_without_token_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["market", "points", "--data-dir"]).arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
    Ok(())
}

#[test]
fn cli_debug_flag_accepted() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = reprise_cmd();
    cmd.args(["--debug", "list", "--data-dir"]).arg(temp.path());
    cmd.assert().success();
    Ok(())
}
