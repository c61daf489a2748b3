use crate::core::error::{ConfigError, RailResult, ResultExt};
use crate::release::version::DEFAULT_STABLE_BRANCHES;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Package feed used when neither config nor `--source` names one
pub const DEFAULT_PACKAGE_SOURCE: &str = "https://resharper-plugins.jetbrains.com/api/v2/package";

/// Configuration for buildrail
/// Searched in order: buildrail.toml, .buildrail.toml, .config/buildrail.toml
///
/// Every section is optional; a workspace without a config file builds with defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub release: ReleaseConfig,
  #[serde(default)]
  pub package: PackageConfig,
  #[serde(default)]
  pub build: BuildConfig,
}

/// Fixed input/output locations, relative to the workspace root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
  #[serde(default = "default_output")]
  pub output: PathBuf,
  #[serde(default = "default_packages")]
  pub packages: PathBuf,
  #[serde(default = "default_test_results")]
  pub test_results: PathBuf,
  #[serde(default = "default_perf_results")]
  pub perf_results: PathBuf,
  #[serde(default = "default_source")]
  pub source: PathBuf,
  #[serde(default = "default_docs")]
  pub docs: PathBuf,
  #[serde(default = "default_docs_site")]
  pub docs_site: PathBuf,
  #[serde(default = "default_changelog")]
  pub changelog: PathBuf,
}

fn default_output() -> PathBuf {
  PathBuf::from("bin")
}

fn default_packages() -> PathBuf {
  PathBuf::from("bin/nuget")
}

fn default_test_results() -> PathBuf {
  PathBuf::from("TestResults")
}

fn default_perf_results() -> PathBuf {
  PathBuf::from("PerfResults")
}

fn default_source() -> PathBuf {
  PathBuf::from("src")
}

fn default_docs() -> PathBuf {
  PathBuf::from("docs")
}

fn default_docs_site() -> PathBuf {
  PathBuf::from("docs/_site")
}

fn default_changelog() -> PathBuf {
  PathBuf::from("CHANGELOG.md")
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      output: default_output(),
      packages: default_packages(),
      test_results: default_test_results(),
      perf_results: default_perf_results(),
      source: default_source(),
      docs: default_docs(),
      docs_site: default_docs_site(),
      changelog: default_changelog(),
    }
  }
}

/// Release versioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  /// Branches finalized with `major.minor.patch` only (default: ["main", "master"])
  #[serde(default = "default_stable_branches")]
  pub stable_branches: Vec<String>,

  /// Browse URL of the repository, used to link the full changelog from release notes
  #[serde(default)]
  pub repository_url: Option<String>,

  /// Commit and tag the finalized changelog (default: true)
  #[serde(default = "default_true")]
  pub commit_on_finalize: bool,
}

fn default_stable_branches() -> Vec<String> {
  DEFAULT_STABLE_BRANCHES.iter().map(|b| b.to_string()).collect()
}

fn default_true() -> bool {
  true
}

impl Default for ReleaseConfig {
  fn default() -> Self {
    Self {
      stable_branches: default_stable_branches(),
      repository_url: None,
      commit_on_finalize: true,
    }
  }
}

/// Package metadata and discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Solution file; discovered in the workspace root when unset
  #[serde(default)]
  pub solution: Option<PathBuf>,

  /// Package feed address (overridden by `--source`)
  #[serde(default = "default_package_source")]
  pub source: String,

  #[serde(default)]
  pub description: Option<String>,

  #[serde(default)]
  pub project_url: Option<String>,

  /// Projects whose name contains any of these are never packed
  #[serde(default = "default_pack_exclude")]
  pub exclude: Vec<String>,

  /// Suffix identifying test projects
  #[serde(default = "default_test_suffix")]
  pub test_suffix: String,
}

fn default_package_source() -> String {
  DEFAULT_PACKAGE_SOURCE.to_string()
}

fn default_pack_exclude() -> Vec<String> {
  vec!["Test".to_string(), "_build".to_string()]
}

fn default_test_suffix() -> String {
  ".Tests".to_string()
}

impl Default for PackageConfig {
  fn default() -> Self {
    Self {
      solution: None,
      source: default_package_source(),
      description: None,
      project_url: None,
      exclude: default_pack_exclude(),
      test_suffix: default_test_suffix(),
    }
  }
}

/// Build settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Default configuration; Debug locally and Release on CI when unset
  #[serde(default)]
  pub configuration: Option<Configuration>,
}

/// Build configuration selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Configuration {
  Debug,
  Release,
}

impl Configuration {
  /// Debug for local builds, Release for CI builds
  pub fn for_environment(is_ci: bool) -> Self {
    if is_ci { Configuration::Release } else { Configuration::Debug }
  }
}

impl fmt::Display for Configuration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Configuration::Debug => write!(f, "Debug"),
      Configuration::Release => write!(f, "Release"),
    }
  }
}

impl FromStr for Configuration {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "debug" => Ok(Configuration::Debug),
      "release" => Ok(Configuration::Release),
      _ => Err(ConfigError::InvalidParameter {
        name: "configuration".to_string(),
        value: s.to_string(),
        expected: "debug or release".to_string(),
      }),
    }
  }
}

impl PipelineConfig {
  /// Find config file in search order: buildrail.toml, .buildrail.toml, .config/buildrail.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("buildrail.toml"),
      path.join(".buildrail.toml"),
      path.join(".config").join("buildrail.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> RailResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: PipelineConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate().map_err(|reason| ConfigError::Invalid {
      path: config_path.clone(),
      reason,
    })?;

    Ok(config)
  }

  /// Save config to buildrail.toml (default location)
  pub fn save(&self, path: &Path) -> RailResult<()> {
    let config_path = path.join("buildrail.toml");
    let content = toml_edit::ser::to_string_pretty(self)
      .map_err(|e| crate::core::error::RailError::message(format!("TOML serialization error: {}", e)))?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Validate configuration values
  pub fn validate(&self) -> Result<(), String> {
    if self.release.stable_branches.iter().any(|b| b.trim().is_empty()) {
      return Err("release.stable_branches must not contain empty names".to_string());
    }

    if self.package.source.trim().is_empty() {
      return Err("package.source must not be empty".to_string());
    }

    if let Some(ref url) = self.release.repository_url
      && !(url.starts_with("https://") || url.starts_with("http://"))
    {
      return Err(format!("release.repository_url '{}' must be an http(s) URL", url));
    }

    if self.paths.changelog.as_os_str().is_empty() {
      return Err("paths.changelog must not be empty".to_string());
    }

    Ok(())
  }

  /// URL of the changelog inside the repository browser, if a repository is configured
  pub fn changelog_url(&self, branch: &str) -> Option<String> {
    self.release.repository_url.as_ref().map(|repo| {
      format!(
        "{}/blob/{}/{}",
        repo.trim_end_matches('/'),
        branch,
        self.paths.changelog.to_string_lossy().replace('\\', "/")
      )
    })
  }
}
