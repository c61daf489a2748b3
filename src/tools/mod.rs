//! External tool adapters
//!
//! Every external program the pipeline drives sits behind a trait so targets can
//! be exercised with a recording fake. The system implementations shell out via
//! `std::process::Command`:
//!
//! - **dotnet**: restore, build, test, pack, push (`dotnet` CLI)
//! - **docfx**: API metadata, site build, local preview server
//! - **git**: stage, commit, tag, current branch
//! - **gitversion**: branch name and computed versions (`dotnet-gitversion`)
//! - **solution**: project discovery from the solution file
//!
//! Child stdout is redirected to our stderr so stdout stays reserved for
//! command results (plans, reports, JSON).

pub mod docfx;
pub mod dotnet;
pub mod git;
pub mod gitversion;
pub mod solution;

use crate::core::error::{RailResult, ToolError};
use crate::release::version::BranchContext;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;

pub use dotnet::{BuildSettings, PackSettings, PushSettings, TestSettings};

/// .NET SDK operations
pub trait DotNet {
  fn restore(&self, solution: &Path) -> RailResult<()>;
  fn build(&self, settings: &BuildSettings) -> RailResult<()>;
  fn test(&self, settings: &TestSettings) -> RailResult<()>;
  fn pack(&self, settings: &PackSettings) -> RailResult<()>;
  fn push(&self, settings: &PushSettings) -> RailResult<()>;
}

/// Documentation generator operations
pub trait DocGenerator {
  /// Extract API metadata described by the docs config
  fn metadata(&self, config: &Path) -> RailResult<()>;
  /// Build the documentation site
  fn build(&self, config: &Path) -> RailResult<()>;
  /// Serve a built site locally (blocks until stopped)
  fn serve(&self, site: &Path) -> RailResult<()>;
}

/// Version control operations used when finalizing a release
pub trait SourceControl {
  fn add(&self, path: &Path) -> RailResult<()>;
  fn commit(&self, message: &str) -> RailResult<()>;
  fn tag(&self, name: &str, force: bool) -> RailResult<()>;
  fn current_branch(&self) -> RailResult<String>;
}

/// Computes branch/version information from commit history
pub trait VersionSource {
  fn branch_context(&self) -> RailResult<BranchContext>;
}

/// The full set of adapters a build runs with
#[derive(Clone)]
pub struct Tools {
  pub dotnet: Arc<dyn DotNet>,
  pub docs: Arc<dyn DocGenerator>,
  pub git: Arc<dyn SourceControl>,
  pub versions: Arc<dyn VersionSource>,
}

impl Tools {
  /// Adapters backed by the real programs, all running from `root`
  pub fn system(root: &Path) -> Self {
    Self {
      dotnet: Arc::new(dotnet::DotNetCli::new(root)),
      docs: Arc::new(docfx::DocFxCli::new(root)),
      git: Arc::new(git::GitCli::new(root)),
      versions: Arc::new(gitversion::GitVersionCli::new(root)),
    }
  }
}

/// Run a command to completion, streaming its output to stderr
pub(crate) fn run(mut command: Command) -> RailResult<()> {
  let rendered = describe(&command);
  debug!(command = %rendered, "running");

  let status = command
    .stdin(Stdio::null())
    .stdout(Stdio::from(io::stderr()))
    .stderr(Stdio::inherit())
    .status()
    .map_err(|e| ToolError::NotFound {
      program: program_name(&command),
      reason: e.to_string(),
    })?;

  if !status.success() {
    return Err(
      ToolError::CommandFailed {
        command: rendered,
        status: status.code(),
        stderr: String::new(),
      }
      .into(),
    );
  }

  Ok(())
}

/// Run a command and return its stdout
pub(crate) fn capture(mut command: Command) -> RailResult<String> {
  let rendered = describe(&command);
  debug!(command = %rendered, "capturing");

  let output = command
    .stdin(Stdio::null())
    .output()
    .map_err(|e| ToolError::NotFound {
      program: program_name(&command),
      reason: e.to_string(),
    })?;

  if !output.status.success() {
    return Err(
      ToolError::CommandFailed {
        command: rendered,
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }
      .into(),
    );
  }

  Ok(String::from_utf8(output.stdout)?)
}

fn program_name(command: &Command) -> String {
  command.get_program().to_string_lossy().to_string()
}

/// Arguments whose following value is a credential
const SECRET_FLAGS: &[&str] = &["--api-key", "-k"];

/// Render a command the way a user would type it, credentials masked
fn describe(command: &Command) -> String {
  let mut parts = vec![command.get_program().to_string_lossy().to_string()];
  let mut mask_next = false;
  for arg in command.get_args() {
    let arg = arg.to_string_lossy();
    if mask_next {
      parts.push("***".to_string());
    } else {
      parts.push(arg.to_string());
    }
    mask_next = SECRET_FLAGS.contains(&arg.as_ref());
  }
  parts.join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::RailError;

  #[test]
  fn test_describe_command() {
    let mut cmd = Command::new("dotnet");
    cmd.args(["build", "App.sln", "--configuration", "Release"]);
    assert_eq!(describe(&cmd), "dotnet build App.sln --configuration Release");
  }

  #[test]
  fn test_describe_masks_api_key() {
    let settings = PushSettings {
      package: "bin/nuget/Lib.1.0.0.nupkg".into(),
      source: "https://feed.example.com".to_string(),
      api_key: Some("SUPER-SECRET-KEY".to_string()),
    };
    let mut cmd = Command::new("dotnet");
    cmd.args(settings.arguments());

    let rendered = describe(&cmd);
    assert!(!rendered.contains("SUPER-SECRET-KEY"));
    assert!(rendered.ends_with("--source https://feed.example.com --api-key ***"));
  }

  #[cfg(unix)]
  #[test]
  fn test_failed_command_error_hides_api_key() {
    let mut cmd = Command::new("false");
    cmd.args(["nuget", "push", "Lib.nupkg", "--api-key", "SUPER-SECRET-KEY"]);

    let err = run(cmd).unwrap_err();
    assert!(matches!(err, RailError::Tool(ToolError::CommandFailed { .. })));
    let message = err.to_string();
    assert!(!message.contains("SUPER-SECRET-KEY"));
    assert!(message.contains("--api-key ***"));
  }

  #[test]
  fn test_missing_program() {
    let err = run(Command::new("buildrail-definitely-missing-program")).unwrap_err();
    assert!(matches!(err, RailError::Tool(ToolError::NotFound { .. })));
  }
}
