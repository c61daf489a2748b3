//! `docfx` adapter for API metadata and the documentation site

use super::{DocGenerator, run};
use crate::core::error::RailResult;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `docfx` from PATH
pub struct DocFxCli {
  root: PathBuf,
}

impl DocFxCli {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  /// Commands run next to the config file so its relative globs resolve
  fn command(&self, subcommand: &str, target: &Path) -> Command {
    let target = self.root.join(target);
    let mut cmd = Command::new("docfx");
    cmd.arg(subcommand).arg(&target);
    match target.parent() {
      Some(dir) if target.is_file() => cmd.current_dir(dir),
      _ => cmd.current_dir(&self.root),
    };
    cmd
  }
}

impl DocGenerator for DocFxCli {
  fn metadata(&self, config: &Path) -> RailResult<()> {
    run(self.command("metadata", config))
  }

  fn build(&self, config: &Path) -> RailResult<()> {
    run(self.command("build", config))
  }

  fn serve(&self, site: &Path) -> RailResult<()> {
    run(self.command("serve", site))
  }
}
