//! Tests for `run`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_run_clean() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("bin/nuget/Lib.1.0.0.nupkg", "")?;
  workspace.write_file("src/Lib/obj/project.assets.json", "{}")?;
  workspace.write_file("src/Lib/bin/Debug/Lib.dll", "")?;
  workspace.write_file("src/Lib/Lib.csproj", "<Project />")?;
  workspace.write_file("TestResults/run.trx", "")?;

  let output = run_buildrail(&workspace.path, &["run", "Clean"])?;
  assert!(stdout(&output).contains("Build succeeded"));

  assert!(workspace.file_exists("bin"));
  assert!(!workspace.file_exists("bin/nuget"));
  assert!(!workspace.file_exists("src/Lib/obj"));
  assert!(!workspace.file_exists("src/Lib/bin"));
  assert!(!workspace.file_exists("TestResults"));
  assert!(workspace.file_exists("src/Lib/Lib.csproj"));
  Ok(())
}

#[test]
fn test_run_report_json() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail(&workspace.path, &["run", "Clean", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["requested"][0], "Clean");
  assert_eq!(report["outcomes"][0]["name"], "Clean");
  assert_eq!(report["outcomes"][0]["state"], "completed");
  Ok(())
}

#[test]
fn test_failing_target_aborts_build() -> Result<()> {
  // No solution file: Restore fails before any tool runs
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail_unchecked(&workspace.path, &["run", "Compile"], &[])?;
  assert_eq!(output.status.code(), Some(3));

  let err = stderr(&output);
  assert!(err.contains("Target 'Restore' failed"));
  assert!(err.contains("caused by: No solution file found"));
  assert!(!stdout(&output).contains("Build succeeded"));
  Ok(())
}

#[test]
fn test_invalid_configuration_parameter() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail_unchecked(&workspace.path, &["run", "Clean", "--configuration", "profile"], &[])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("debug or release"));
  Ok(())
}

#[test]
fn test_invalid_ci_context() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail_unchecked(&workspace.path, &["run", "Clean"], &[("GITHUB_CONTEXT", "{not json")])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("GITHUB_CONTEXT is not valid JSON"));
  Ok(())
}

#[test]
fn test_invalid_config_file() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("buildrail.toml", "[package]\nsource = \"\"\n")?;

  let output = run_buildrail_unchecked(&workspace.path, &["run", "Clean"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("package.source must not be empty"));
  Ok(())
}
