//! Target execution
//!
//! Runs a resolved plan strictly sequentially. Each target:
//!
//! 1. is skipped (not failed) when its condition is false; dependents still run
//! 2. otherwise runs exactly once
//! 3. on failure aborts the run; nothing after it starts
//!
//! State is kept per executor and reset at the start of every run.

use crate::core::error::{RailError, RailResult};
use crate::core::plan::{ExecutionPlan, PlanId};
use crate::graph::TargetGraph;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info};

/// Lifecycle of a target within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
  NotStarted,
  Running,
  Completed,
  Skipped,
  Failed,
}

impl fmt::Display for TargetState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TargetState::NotStarted => write!(f, "not started"),
      TargetState::Running => write!(f, "running"),
      TargetState::Completed => write!(f, "completed"),
      TargetState::Skipped => write!(f, "skipped"),
      TargetState::Failed => write!(f, "failed"),
    }
  }
}

/// What happened to one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
  pub name: String,
  pub state: TargetState,
  pub duration_ms: u64,
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub plan_id: PlanId,
  pub requested: Vec<String>,
  pub outcomes: Vec<TargetOutcome>,
  pub duration_ms: u64,
}

impl RunReport {
  pub fn count(&self, state: TargetState) -> usize {
    self.outcomes.iter().filter(|o| o.state == state).count()
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> RailResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    for outcome in &self.outcomes {
      let marker = match outcome.state {
        TargetState::Completed => "✅",
        TargetState::Skipped => "⏭️ ",
        _ => "❌",
      };
      output.push_str(&format!(
        "   {} {} ({}, {}ms)\n",
        marker, outcome.name, outcome.state, outcome.duration_ms
      ));
    }

    output.push_str(&format!(
      "\n🎉 Build succeeded: {} completed, {} skipped in {:.1}s\n",
      self.count(TargetState::Completed),
      self.count(TargetState::Skipped),
      self.duration_ms as f64 / 1000.0
    ));

    output
  }
}

/// Runs targets of a graph against a context
pub struct Executor<'g, C> {
  graph: &'g TargetGraph<C>,
  states: HashMap<String, TargetState>,
}

impl<'g, C> Executor<'g, C> {
  pub fn new(graph: &'g TargetGraph<C>) -> Self {
    Self {
      graph,
      states: HashMap::new(),
    }
  }

  /// Resolve without executing (dry run)
  pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> RailResult<ExecutionPlan> {
    Ok(ExecutionPlan::build(self.graph, requested)?)
  }

  /// State of a target in the most recent run
  pub fn state(&self, name: &str) -> TargetState {
    self.states.get(name).copied().unwrap_or(TargetState::NotStarted)
  }

  /// Resolve and execute the requested targets
  pub fn run<S: AsRef<str>>(&mut self, ctx: &C, requested: &[S]) -> RailResult<RunReport> {
    let plan = self.plan(requested)?;
    self.execute(ctx, &plan)
  }

  /// Execute an already-resolved plan
  pub fn execute(&mut self, ctx: &C, plan: &ExecutionPlan) -> RailResult<RunReport> {
    self.states = self
      .graph
      .targets()
      .map(|t| (t.name().to_string(), TargetState::NotStarted))
      .collect();

    info!(plan = %plan.id, targets = plan.len(), "starting build");
    let run_start = Instant::now();
    let mut outcomes = Vec::with_capacity(plan.len());

    for name in plan.order() {
      if self.state(name) != TargetState::NotStarted {
        continue;
      }

      let Some(target) = self.graph.get(name) else {
        return Err(RailError::message(format!("Planned target '{}' is not registered", name)));
      };

      if !target.should_run(ctx) {
        info!(target_name = name, "skipped: condition not met");
        self.states.insert(name.to_string(), TargetState::Skipped);
        outcomes.push(TargetOutcome {
          name: name.to_string(),
          state: TargetState::Skipped,
          duration_ms: 0,
        });
        continue;
      }

      info!(target_name = name, "running");
      self.states.insert(name.to_string(), TargetState::Running);
      let start = Instant::now();

      let result = target.execute(ctx);
      let duration_ms = start.elapsed().as_millis() as u64;

      match result {
        Ok(()) => {
          debug!(target_name = name, duration_ms, "completed");
          self.states.insert(name.to_string(), TargetState::Completed);
          outcomes.push(TargetOutcome {
            name: name.to_string(),
            state: TargetState::Completed,
            duration_ms,
          });
        }
        Err(e) => {
          error!(target_name = name, duration_ms, error = %e, "failed");
          self.states.insert(name.to_string(), TargetState::Failed);
          return Err(RailError::target_failed(name, e));
        }
      }
    }

    let duration_ms = run_start.elapsed().as_millis() as u64;
    info!(plan = %plan.id, duration_ms, "build succeeded");

    Ok(RunReport {
      plan_id: plan.id.clone(),
      requested: plan.requested.clone(),
      outcomes,
      duration_ms,
    })
  }
}
