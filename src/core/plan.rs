//! Execution plans for reviewable, reproducible runs
//!
//! Every run resolves an `ExecutionPlan` before any target body executes,
//! enabling:
//!
//! - **Dry-run mode**: show the order without running anything
//! - **Determinism**: same graph + same request → same plan → same id
//! - **Auditability**: plans are JSON-serializable for CI logs
//!
//! # Architecture
//!
//! ```text
//! Command (run, plan)
//!   ↓
//! ExecutionPlan (what runs, in which order)
//!   ↓
//! Executor (apply the plan)
//!   ↓
//! RunReport
//! ```

use crate::core::error::{GraphError, RailResult};
use crate::graph::TargetGraph;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTarget {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub description: Option<String>,
  pub depends_on: Vec<String>,
  /// Has a run condition; may be skipped at execution time
  pub conditional: bool,
}

/// Ordered targets for a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
  /// Plan ID (content hash of requested targets and order)
  pub id: PlanId,

  /// Targets named by the caller
  pub requested: Vec<String>,

  /// Targets to execute (in order)
  pub targets: Vec<PlannedTarget>,
}

impl ExecutionPlan {
  /// Resolve the order for `requested` and describe each step
  pub fn build<C, S: AsRef<str>>(graph: &TargetGraph<C>, requested: &[S]) -> Result<Self, GraphError> {
    let order = graph.resolve_order_many(requested)?;

    let targets = order
      .into_iter()
      .filter_map(|name| graph.get(&name))
      .map(|target| PlannedTarget {
        name: target.name().to_string(),
        description: target.description_text().map(str::to_string),
        depends_on: target.dependencies().to_vec(),
        conditional: target.is_conditional(),
      })
      .collect::<Vec<_>>();

    let requested: Vec<String> = requested.iter().map(|n| n.as_ref().to_string()).collect();

    // Hash (requested, targets) so the id is stable across processes
    let contents = serde_json::to_vec(&(&requested, &targets)).unwrap_or_default();

    Ok(Self {
      id: PlanId::from_contents(&contents),
      requested,
      targets,
    })
  }

  /// Target names in execution order
  pub fn order(&self) -> Vec<&str> {
    self.targets.iter().map(|t| t.name.as_str()).collect()
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> RailResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Plan: {} ({})\n", self.requested.join(", "), self.id));
    output.push_str(&format!("\n   Targets ({}):\n", self.targets.len()));

    for (i, target) in self.targets.iter().enumerate() {
      output.push_str(&format!("   {}. {}", i + 1, target.name));
      if target.conditional {
        output.push_str(" (conditional)");
      }
      if let Some(ref description) = target.description {
        output.push_str(&format!(" - {}", description));
      }
      output.push('\n');
    }

    output
  }

  /// Get number of targets
  pub fn len(&self) -> usize {
    self.targets.len()
  }
}
