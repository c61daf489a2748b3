//! `buildrail version`: what the next build would be stamped with

use crate::core::context::BuildContext;
use crate::core::error::RailResult;
use crate::release::version::release_version_string;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VersionInfo {
  release_version: String,
  package_version: String,
  build_number: u64,
  configuration: String,
  release_notes: String,
}

pub fn run_version(ctx: &BuildContext, json: bool) -> RailResult<()> {
  let changelog = ctx.changelog();
  let release = release_version_string(&changelog.load()?).map_err(|e| e.with_path(changelog.path()))?;
  let resolved = ctx.resolved_version()?;

  let info = VersionInfo {
    release_version: release,
    package_version: resolved.version,
    build_number: ctx.ci.build_number,
    configuration: ctx.parameters.configuration.to_string(),
    release_notes: resolved.notes,
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&info)?);
    return Ok(());
  }

  println!("📦 Package version: {}", info.package_version);
  println!("   Release version: {}", info.release_version);
  println!("   Build number:    {}", info.build_number);
  println!("   Configuration:   {}", info.configuration);
  if !info.release_notes.is_empty() {
    println!("\n{}", info.release_notes);
  }
  Ok(())
}
