//! `buildrail init`: write a default buildrail.toml

use crate::core::config::PipelineConfig;
use crate::core::error::{RailError, RailResult};
use std::path::Path;

pub fn run_init(root: &Path, force: bool) -> RailResult<()> {
  if let Some(existing) = PipelineConfig::find_config_path(root)
    && !force
  {
    return Err(RailError::with_help(
      format!("Configuration already exists at {}", existing.display()),
      "Use --force to overwrite it",
    ));
  }

  PipelineConfig::default().save(root)?;
  println!("✅ Wrote {}", root.join("buildrail.toml").display());
  println!("   Set release.repository_url to link the full changelog from package notes");
  Ok(())
}
