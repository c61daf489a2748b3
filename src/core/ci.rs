//! CI environment detection
//!
//! The only structured input read from the environment is the GitHub Actions
//! context payload (`GITHUB_CONTEXT`, usually `${{ toJson(github) }}`), which
//! supplies the monotonically increasing run number used as build number.

use crate::core::error::{RailError, RailResult};
use serde::Serialize;
use serde_json::Value;

/// Environment variable carrying the CI context payload
pub const CONTEXT_VAR: &str = "GITHUB_CONTEXT";

/// What the pipeline knows about the machine it runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CiEnvironment {
  /// Run number from the CI payload, 0 for local builds
  pub build_number: u64,
  /// Running on a build server rather than a developer machine
  pub is_ci: bool,
}

impl CiEnvironment {
  /// Read `GITHUB_CONTEXT` and `CI` from the process environment
  pub fn from_env() -> RailResult<Self> {
    let payload = std::env::var(CONTEXT_VAR).ok();
    let ci_flag = std::env::var("CI").ok();
    Self::from_parts(payload.as_deref(), ci_flag.as_deref())
  }

  /// Build from raw variable values (absent or blank payload → build number 0)
  pub fn from_parts(payload: Option<&str>, ci_flag: Option<&str>) -> RailResult<Self> {
    let payload = payload.map(str::trim).filter(|p| !p.is_empty());
    let build_number = match payload {
      Some(json) => parse_run_number(json)?,
      None => 0,
    };

    let flagged = ci_flag.is_some_and(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"));

    Ok(Self {
      build_number,
      is_ci: payload.is_some() || flagged,
    })
  }
}

/// Extract `run_number` (string or integer) from the context payload
fn parse_run_number(json: &str) -> RailResult<u64> {
  let context: Value = serde_json::from_str(json)
    .map_err(|e| RailError::with_help(format!("{} is not valid JSON: {}", CONTEXT_VAR, e), "Unset it for local builds"))?;

  let run_number = context
    .get("run_number")
    .ok_or_else(|| RailError::message(format!("{} has no run_number property", CONTEXT_VAR)))?;

  let parsed = match run_number {
    Value::String(s) => s.trim().parse::<u64>().ok(),
    Value::Number(n) => n.as_u64(),
    _ => None,
  };

  parsed.ok_or_else(|| RailError::message(format!("{}.run_number is not a number: {}", CONTEXT_VAR, run_number)))
}
