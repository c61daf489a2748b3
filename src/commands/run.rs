//! `buildrail run` and `buildrail plan`

use crate::core::context::BuildContext;
use crate::core::error::RailResult;
use crate::core::executor::Executor;
use crate::targets::{DEFAULT_TARGET, standard_targets};

/// Requested targets, or the default one
fn requested_or_default(targets: Vec<String>) -> Vec<String> {
  if targets.is_empty() {
    vec![DEFAULT_TARGET.to_string()]
  } else {
    targets
  }
}

/// Run the requested targets (or only show the plan with `dry_run`)
pub fn run_targets(ctx: &BuildContext, targets: Vec<String>, dry_run: bool, json: bool) -> RailResult<()> {
  let targets = requested_or_default(targets);
  let graph = standard_targets()?;
  let mut executor = Executor::new(&graph);

  if dry_run {
    let plan = executor.plan(&targets)?;
    if json {
      println!("{}", plan.to_json()?);
    } else {
      println!("{}", plan.to_human_readable());
      println!("💡 Dry run: nothing was executed");
    }
    return Ok(());
  }

  if !json {
    println!(
      "🚀 Building {} ({} configuration, build #{})",
      targets.join(", "),
      ctx.parameters.configuration,
      ctx.ci.build_number
    );
  }

  let report = executor.run(ctx, &targets)?;

  if json {
    println!("{}", report.to_json()?);
  } else {
    println!("{}", report.to_human_readable());
  }
  Ok(())
}

/// Show the execution order without running anything
pub fn run_plan(targets: Vec<String>, json: bool) -> RailResult<()> {
  let graph = standard_targets()?;
  let plan = Executor::new(&graph).plan(&requested_or_default(targets))?;

  if json {
    println!("{}", plan.to_json()?);
  } else {
    println!("{}", plan.to_human_readable());
  }
  Ok(())
}
