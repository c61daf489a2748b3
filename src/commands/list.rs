//! `buildrail list`: registered targets in declaration order

use crate::core::error::RailResult;
use crate::targets::{DEFAULT_TARGET, standard_targets};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TargetInfo<'a> {
  name: &'a str,
  description: Option<&'a str>,
  depends_on: &'a [String],
  before: &'a [String],
  after: &'a [String],
  conditional: bool,
  default: bool,
}

pub fn run_list(json: bool) -> RailResult<()> {
  let graph = standard_targets()?;
  let targets: Vec<TargetInfo> = graph
    .targets()
    .map(|t| TargetInfo {
      name: t.name(),
      description: t.description_text(),
      depends_on: t.dependencies(),
      before: t.runs_before(),
      after: t.runs_after(),
      conditional: t.is_conditional(),
      default: t.name() == DEFAULT_TARGET,
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&targets)?);
    return Ok(());
  }

  println!("🎯 Targets ({}):\n", graph.len());
  let width = targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
  for target in &targets {
    let marker = if target.default { " (default)" } else { "" };
    println!(
      "  {:width$}  {}{}",
      target.name,
      target.description.unwrap_or(""),
      marker,
      width = width
    );
    if !target.depends_on.is_empty() {
      println!("  {:width$}    depends on: {}", "", target.depends_on.join(", "), width = width);
    }
  }
  Ok(())
}
