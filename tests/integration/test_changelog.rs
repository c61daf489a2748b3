//! Tests for the `changelog` commands

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_finalize_stamps_unreleased_section() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  run_buildrail(&workspace.path, &["changelog", "finalize", "1.2.0", "--date", "2024-03-01"])?;

  let text = workspace.read_file("CHANGELOG.md")?;
  assert!(text.starts_with("# Changelog\n"));
  assert!(text.contains("## [vNext]\n\n## [1.2.0] / 2024-03-01\n- Streaming API\n"));
  // Older sections are untouched
  assert!(text.contains("## [1.1.0] / 2024-02-10\n- Retry policy\n- Timeouts\n"));
  assert!(text.ends_with("## [1.0.0] / 2024-01-05\n- Initial release\n"));

  Ok(())
}

#[test]
fn test_finalize_without_reopen() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  run_buildrail(
    &workspace.path,
    &["changelog", "finalize", "v1.2.0", "--date", "2024-03-01", "--no-reopen"],
  )?;
  assert!(!workspace.read_file("CHANGELOG.md")?.contains("[vNext]"));

  // Nothing left to finalize
  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "finalize", "1.3.0"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("has no unreleased section"));

  Ok(())
}

#[test]
fn test_finalize_existing_version_fails() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "finalize", "1.1.0"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("already has a section for 1.1.0"));

  // File left as it was
  assert_eq!(workspace.read_file("CHANGELOG.md")?, CHANGELOG);
  Ok(())
}

#[test]
fn test_finalize_rejects_bad_date() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail_unchecked(
    &workspace.path,
    &["changelog", "finalize", "1.2.0", "--date", "03/01/2024"],
    &[],
  )?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Invalid date"));
  assert_eq!(workspace.read_file("CHANGELOG.md")?, CHANGELOG);
  Ok(())
}

#[test]
fn test_latest_version() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail(&workspace.path, &["changelog", "latest"])?;
  assert_eq!(stdout(&output).trim(), "1.1.0 (2024-02-10)");

  let output = run_buildrail(&workspace.path, &["changelog", "latest", "--json"])?;
  let json: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(json["version"], "1.1.0");
  assert_eq!(json["date"], "2024-02-10");
  assert_eq!(json["notes"][1], "- Timeouts");

  Ok(())
}

#[test]
fn test_latest_ignores_section_order() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("CHANGELOG.md", "## [1.1.0]\n- b\n\n## [1.2.0]\n- c\n\n## [1.0.0]\n- a\n")?;

  let output = run_buildrail(&workspace.path, &["changelog", "latest"])?;
  assert_eq!(stdout(&output).trim(), "1.2.0");
  Ok(())
}

#[test]
fn test_section_notes() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail(&workspace.path, &["changelog", "notes"])?;
  assert_eq!(stdout(&output), "- Retry policy\n- Timeouts\n");

  let output = run_buildrail(&workspace.path, &["changelog", "notes", "1.0.0"])?;
  assert_eq!(stdout(&output), "- Initial release\n");

  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "notes", "9.9.9"], &[])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Version 9.9.9 not found"));

  Ok(())
}

#[test]
fn test_check_valid_changelog() -> Result<()> {
  let workspace = TestWorkspace::with_changelog()?;

  let output = run_buildrail(&workspace.path, &["changelog", "check"])?;
  let out = stdout(&output);
  assert!(out.contains("Released versions: 1.1.0, 1.0.0"));
  assert!(out.contains("Unreleased section: present"));
  assert!(out.contains("Changelog is valid"));
  Ok(())
}

#[test]
fn test_check_malformed_heading() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("CHANGELOG.md", "# Changelog\n\n## Something else\n- note\n")?;

  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "check"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("Malformed changelog"));
  assert!(err.contains("CHANGELOG.md"));
  Ok(())
}

#[test]
fn test_check_without_releases() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("CHANGELOG.md", "# Changelog\n\n## [vNext]\n- pending\n")?;

  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "check"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("defines no released version"));
  Ok(())
}

#[test]
fn test_missing_changelog() -> Result<()> {
  let workspace = TestWorkspace::new()?;

  let output = run_buildrail_unchecked(&workspace.path, &["changelog", "latest"], &[])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Failed to read changelog"));
  Ok(())
}

#[test]
fn test_configured_changelog_path() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("buildrail.toml", "[paths]\nchangelog = \"docs/RELEASES.md\"\n")?;
  workspace.write_file("docs/RELEASES.md", CHANGELOG)?;

  let output = run_buildrail(&workspace.path, &["changelog", "latest"])?;
  assert!(stdout(&output).starts_with("1.1.0"));
  Ok(())
}
