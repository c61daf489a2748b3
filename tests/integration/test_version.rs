//! Tests for `version`

use crate::helpers::*;
use anyhow::Result;

fn version_json(workspace: &TestWorkspace, args: &[&str], envs: &[(&str, &str)]) -> Result<serde_json::Value> {
  let mut all = vec!["version", "--json"];
  all.extend_from_slice(args);
  let output = run_buildrail_with_env(&workspace.path, &all, envs)?;
  Ok(serde_json::from_str(&stdout(&output))?)
}

#[test]
fn test_version_from_changelog() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let info = version_json(&workspace, &[], &[])?;
  assert_eq!(info["release_version"], "1.1.0");
  assert_eq!(info["package_version"], "1.1.0");
  assert_eq!(info["build_number"], 0);
  assert_eq!(info["configuration"], "Debug");
  assert_eq!(info["release_notes"], "- Retry policy\n- Timeouts");
  Ok(())
}

#[test]
fn test_version_prerelease_override() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let info = version_json(&workspace, &["--prerelease", "beta.2"], &[])?;
  assert_eq!(info["release_version"], "1.1.0");
  assert_eq!(info["package_version"], "1.1.0-beta.2");
  Ok(())
}

#[test]
fn test_version_on_ci() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let info = version_json(&workspace, &[], &[("GITHUB_CONTEXT", r#"{"run_number":"42"}"#)])?;
  assert_eq!(info["build_number"], 42);
  assert_eq!(info["configuration"], "Release");

  let info = version_json(
    &workspace,
    &["--configuration", "debug"],
    &[("GITHUB_CONTEXT", r#"{"run_number":7}"#)],
  )?;
  assert_eq!(info["build_number"], 7);
  assert_eq!(info["configuration"], "Debug");
  Ok(())
}

#[test]
fn test_version_configured_default() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;
  workspace.write_file("buildrail.toml", "[build]\nconfiguration = \"release\"\n")?;

  let info = version_json(&workspace, &[], &[])?;
  assert_eq!(info["configuration"], "Release");
  Ok(())
}

#[test]
fn test_version_human_output() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail(&workspace.path, &["version"])?;
  let out = stdout(&output);
  assert!(out.contains("Package version: 1.1.0"));
  assert!(out.contains("- Retry policy"));
  Ok(())
}

#[test]
fn test_version_without_release() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("CHANGELOG.md", "## [vNext]\n- pending\n")?;

  let output = run_buildrail_unchecked(&workspace.path, &["version"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("defines no released version"));
  Ok(())
}
