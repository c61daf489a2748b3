//! GitVersion adapter: branch name and computed versions from commit history

use super::{VersionSource, capture};
use crate::core::error::{RailResult, ToolError};
use crate::release::version::BranchContext;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

const PROGRAM: &str = "dotnet-gitversion";

/// Subset of the GitVersion JSON variables we consume
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GitVersionVariables {
  branch_name: String,
  sem_ver: String,
  major_minor_patch: String,
}

/// `dotnet-gitversion` from PATH
pub struct GitVersionCli {
  root: PathBuf,
}

impl GitVersionCli {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }
}

impl VersionSource for GitVersionCli {
  fn branch_context(&self) -> RailResult<BranchContext> {
    let mut cmd = Command::new(PROGRAM);
    cmd.current_dir(&self.root).args(["/output", "json"]);
    parse_variables(&capture(cmd)?)
  }
}

/// Parse `dotnet-gitversion /output json`
pub fn parse_variables(json: &str) -> RailResult<BranchContext> {
  let vars: GitVersionVariables = serde_json::from_str(json).map_err(|e| ToolError::InvalidOutput {
    command: PROGRAM.to_string(),
    reason: e.to_string(),
  })?;

  Ok(BranchContext::new(vars.branch_name, vars.sem_ver, vars.major_minor_patch))
}
