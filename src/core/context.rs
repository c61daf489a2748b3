//! Build context - build once, pass to every target
//!
//! # Design
//!
//! All inputs a target may consult (workspace root, configuration, command-line
//! parameters, CI environment, tool adapters) are resolved once in main.rs and
//! passed by reference. Target bodies never read the process environment.
//!
//! # Architecture
//!
//! ```text
//! main.rs:
//!   BuildContext::new(...) -> &BuildContext
//!   |
//!   v
//! Executor::run(&ctx, targets)
//!   |
//!   v
//! target bodies: fn(&BuildContext) -> RailResult<()>
//! ```
//!
//! Version data is not cached: finalizing rewrites the changelog mid-run, so
//! every read goes to disk.

use crate::core::ci::CiEnvironment;
use crate::core::config::{Configuration, PipelineConfig};
use crate::core::error::{RailError, RailResult};
use crate::release::changelog::ChangelogFile;
use crate::release::version::{BranchContext, ResolvedVersion, latest_version};
use crate::tools::Tools;
use crate::tools::solution::Solution;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable holding the package feed API key
pub const API_KEY_VAR: &str = "NUGET_API_KEY";

/// Parameters supplied on the command line (already merged with config defaults)
#[derive(Debug, Clone, Serialize)]
pub struct BuildParameters {
  pub configuration: Configuration,
  /// Replaces the prerelease label of the changelog version when set
  pub prerelease: Option<String>,
  /// Package feed address
  pub source: String,
  #[serde(skip)]
  pub api_key: Option<String>,
  /// Date stamped on a finalized changelog section
  pub release_date: NaiveDate,
}

impl BuildParameters {
  /// Defaults for a workspace: configured or environment-derived configuration, configured feed
  pub fn from_config(config: &PipelineConfig, ci: &CiEnvironment) -> Self {
    Self {
      configuration: config
        .build
        .configuration
        .unwrap_or_else(|| Configuration::for_environment(ci.is_ci)),
      prerelease: None,
      source: config.package.source.clone(),
      api_key: None,
      release_date: Local::now().date_naive(),
    }
  }
}

/// Everything a target body can see.
///
/// Cheap to clone: configuration and adapters are shared via Arc.
#[derive(Clone)]
pub struct BuildContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// Pipeline configuration (buildrail.toml or defaults)
  pub config: Arc<PipelineConfig>,

  pub parameters: BuildParameters,

  pub ci: CiEnvironment,

  /// External tool adapters
  pub tools: Tools,
}

impl BuildContext {
  pub fn new(
    root: impl Into<PathBuf>,
    config: PipelineConfig,
    parameters: BuildParameters,
    ci: CiEnvironment,
    tools: Tools,
  ) -> Self {
    Self {
      root: root.into(),
      config: Arc::new(config),
      parameters,
      ci,
      tools,
    }
  }

  /// Resolve a configured path against the workspace root
  pub fn path(&self, relative: &Path) -> PathBuf {
    self.root.join(relative)
  }

  pub fn changelog(&self) -> ChangelogFile {
    ChangelogFile::new(self.path(&self.config.paths.changelog))
  }

  pub fn solution(&self) -> RailResult<Solution> {
    Solution::discover(&self.root, self.config.package.solution.as_deref())
  }

  /// Branch and computed versions (invokes the version tool)
  pub fn branch_context(&self) -> RailResult<BranchContext> {
    self.tools.versions.branch_context()
  }

  /// Latest released version, read fresh from the changelog
  pub fn release_version(&self) -> RailResult<semver::Version> {
    let changelog = self.changelog();
    let document = changelog.load()?;
    let entry = latest_version(&document).map_err(|e| e.with_path(changelog.path()))?;
    Ok(entry.version.clone().unwrap_or_else(|| semver::Version::new(0, 0, 0)))
  }

  /// Package version and release notes, read fresh from the changelog
  pub fn resolved_version(&self) -> RailResult<ResolvedVersion> {
    let changelog = self.changelog();
    let document = changelog.load()?;

    let changelog_url = match self.config.release.repository_url {
      Some(_) => {
        let branch = self.tools.git.current_branch()?;
        self.config.changelog_url(&branch)
      }
      None => None,
    };

    ResolvedVersion::resolve(&document, self.parameters.prerelease.as_deref(), changelog_url.as_deref())
      .map_err(|e| match e {
        RailError::Changelog(inner) => inner.with_path(changelog.path()).into(),
        other => other,
      })
  }
}
