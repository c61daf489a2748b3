//! System git adapter used to record a finalized release

use super::{SourceControl, capture, run};
use crate::core::error::RailResult;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using the system `git` binary
pub struct GitCli {
  root: PathBuf,
}

impl GitCli {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  /// Git command with an isolated environment
  ///
  /// Only PATH, HOME and the author/committer identity pass through, so
  /// stray `GIT_DIR`-style variables cannot redirect the repository.
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.root);

    cmd.env_clear();
    for var in [
      "PATH",
      "HOME",
      "GIT_AUTHOR_NAME",
      "GIT_AUTHOR_EMAIL",
      "GIT_COMMITTER_NAME",
      "GIT_COMMITTER_EMAIL",
    ] {
      if let Ok(value) = std::env::var(var) {
        cmd.env(var, value);
      }
    }

    cmd.arg("-c").arg("core.quotePath=false");
    cmd
  }
}

impl SourceControl for GitCli {
  fn add(&self, path: &Path) -> RailResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("add").arg(path);
    run(cmd)
  }

  fn commit(&self, message: &str) -> RailResult<()> {
    let mut cmd = self.git_cmd();
    cmd.args(["commit", "-m", message]);
    run(cmd)
  }

  fn tag(&self, name: &str, force: bool) -> RailResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("tag");
    if force {
      cmd.arg("-f");
    }
    cmd.arg(name);
    run(cmd)
  }

  fn current_branch(&self) -> RailResult<String> {
    let mut cmd = self.git_cmd();
    cmd.args(["rev-parse", "--abbrev-ref", "HEAD"]);
    Ok(capture(cmd)?.trim().to_string())
  }
}
