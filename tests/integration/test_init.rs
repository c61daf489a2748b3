//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_creates_config() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  run_buildrail(&workspace.path, &["init"])?;
  assert!(workspace.file_exists("buildrail.toml"));

  let config = workspace.read_file("buildrail.toml")?;
  assert!(config.contains("[paths]"));
  assert!(config.contains("[release]"));
  assert!(config.contains("stable_branches"));
  assert!(config.contains("resharper-plugins.jetbrains.com"));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file(".config/buildrail.toml", "[release]\nstable_branches = [\"trunk\"]\n")?;

  let output = run_buildrail_unchecked(&workspace.path, &["init"], &[])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Configuration already exists"));

  run_buildrail(&workspace.path, &["init", "--force"])?;
  assert!(workspace.file_exists("buildrail.toml"));
  Ok(())
}

#[test]
fn test_generated_config_loads() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  run_buildrail(&workspace.path, &["init"])?;
  let output = run_buildrail(&workspace.path, &["version"])?;
  assert!(stdout(&output).contains("1.1.0"));
  Ok(())
}
