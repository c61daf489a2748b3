//! Tests for `plan` and `list`

use crate::helpers::*;
use anyhow::Result;

fn plan_order(json: &str) -> Result<Vec<String>> {
  let plan: serde_json::Value = serde_json::from_str(json)?;
  Ok(
    plan["targets"]
      .as_array()
      .map(|targets| {
        targets
          .iter()
          .filter_map(|t| t["name"].as_str().map(String::from))
          .collect()
      })
      .unwrap_or_default(),
  )
}

#[test]
fn test_plan_default_target() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail(&workspace.path, &["plan"])?;
  let out = stdout(&output);
  assert!(out.contains("Plan: CreatePackage"));
  assert!(out.contains("1. Restore"));
  assert!(out.contains("2. Compile"));
  assert!(out.contains("3. RunTests"));
  assert!(out.contains("4. CreatePackage"));
  assert!(!out.contains("Publish"));
  Ok(())
}

#[test]
fn test_plan_several_targets() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail(&workspace.path, &["plan", "CreatePackage", "Clean", "--json"])?;
  assert_eq!(
    plan_order(&stdout(&output))?,
    vec!["Clean", "Restore", "Compile", "RunTests", "CreatePackage"]
  );
  Ok(())
}

#[test]
fn test_plan_is_deterministic() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let first = stdout(&run_buildrail(&workspace.path, &["plan", "ServeDocs", "Publish", "--json"])?);
  let second = stdout(&run_buildrail(&workspace.path, &["plan", "ServeDocs", "Publish", "--json"])?);
  assert_eq!(first, second);
  Ok(())
}

#[test]
fn test_plan_unknown_target() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail_unchecked(&workspace.path, &["plan", "Deploy"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("Unknown target 'Deploy'"));
  assert!(err.contains("Available targets:"));
  Ok(())
}

#[test]
fn test_run_dry_run_executes_nothing() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("bin/keep.txt", "artifact")?;

  let output = run_buildrail(&workspace.path, &["run", "Clean", "--dry-run", "--json"])?;
  assert_eq!(plan_order(&stdout(&output))?, vec!["Clean"]);
  assert!(workspace.file_exists("bin/keep.txt"));
  Ok(())
}

#[test]
fn test_list_targets() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail(&workspace.path, &["list", "--json"])?;
  let targets: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output))?;
  let names: Vec<&str> = targets.iter().filter_map(|t| t["name"].as_str()).collect();
  assert_eq!(
    names,
    vec![
      "Clean",
      "Restore",
      "Compile",
      "RunTests",
      "CreatePackage",
      "Publish",
      "RunChangelog",
      "CreateMetadata",
      "DocFx",
      "ServeDocs",
    ]
  );

  let package = targets.iter().find(|t| t["name"] == "CreatePackage").unwrap();
  assert_eq!(package["default"], true);
  let publish = targets.iter().find(|t| t["name"] == "Publish").unwrap();
  assert_eq!(publish["conditional"], true);

  let output = run_buildrail(&workspace.path, &["list"])?;
  assert!(stdout(&output).contains("(default)"));
  Ok(())
}
