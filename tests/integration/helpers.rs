//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const CHANGELOG: &str = "# Changelog\n\
\n\
## [vNext]\n\
- Streaming API\n\
\n\
## [1.1.0] / 2024-02-10\n\
- Retry policy\n\
- Timeouts\n\
\n\
## [1.0.0] / 2024-01-05\n\
- Initial release\n";

/// A throwaway workspace directory
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create an empty workspace
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Create a workspace with the standard changelog
  pub fn with_changelog() -> Result<Self> {
    let workspace = Self::new()?;
    workspace.write_file("CHANGELOG.md", CHANGELOG)?;
    Ok(workspace)
  }

  /// Write a file, creating parent directories
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let file_path = self.path.join(path);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Command for the buildrail binary with CI variables cleared
fn buildrail_command(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Command {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildrail"));
  cmd
    .current_dir(cwd)
    .args(args)
    .env_remove("GITHUB_CONTEXT")
    .env_remove("CI")
    .env_remove("NUGET_API_KEY")
    .env_remove("RUST_LOG");
  for (key, value) in envs {
    cmd.env(key, value);
  }
  cmd
}

/// Run buildrail and require success
pub fn run_buildrail(cwd: &Path, args: &[&str]) -> Result<Output> {
  run_buildrail_with_env(cwd, args, &[])
}

/// Run buildrail with extra environment variables and require success
pub fn run_buildrail_with_env(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  let output = buildrail_command(cwd, args, envs)
    .output()
    .context("Failed to run buildrail")?;

  if !output.status.success() {
    anyhow::bail!(
      "buildrail command failed: buildrail {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }

  Ok(output)
}

/// Run buildrail and return its output whatever the exit status
pub fn run_buildrail_unchecked(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  buildrail_command(cwd, args, envs)
    .output()
    .context("Failed to run buildrail")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
