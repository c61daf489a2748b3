//! Version resolution: branch context + changelog → release version and notes
//!
//! The changelog is the single source of truth for the version stamped onto
//! produced artifacts. Branch context only decides the tag used when the
//! changelog itself is finalized.

use crate::core::error::{ChangelogError, ConfigError, RailResult};
use crate::release::changelog::{ChangelogDocument, ReleaseEntry};
use serde::{Deserialize, Serialize};

/// Branches whose builds are stamped without prerelease metadata by default
pub const DEFAULT_STABLE_BRANCHES: &[&str] = &["main", "master"];

/// Version information for the checked-out branch, computed from commit history
/// by an external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchContext {
  pub branch: String,
  /// Full computed version, including prerelease metadata (`2.3.0-beta.4`)
  pub sem_ver: String,
  /// `major.minor.patch` only (`2.3.0`)
  pub major_minor_patch: String,
}

impl BranchContext {
  pub fn new(branch: impl Into<String>, sem_ver: impl Into<String>, major_minor_patch: impl Into<String>) -> Self {
    Self {
      branch: branch.into(),
      sem_ver: sem_ver.into(),
      major_minor_patch: major_minor_patch.into(),
    }
  }
}

/// Version used to finalize the changelog on this branch.
///
/// Stable branches get a clean `major.minor.patch`; any other branch keeps the
/// prerelease metadata so feature-branch builds are visibly pre-release.
pub fn select_prerelease_tag<S: AsRef<str>>(context: &BranchContext, stable_branches: &[S]) -> String {
  let is_stable = stable_branches.iter().any(|b| b.as_ref() == context.branch);
  if is_stable {
    context.major_minor_patch.clone()
  } else {
    context.sem_ver.clone()
  }
}

/// Highest-precedence released entry, regardless of file order
pub fn latest_version(document: &ChangelogDocument) -> Result<&ReleaseEntry, ChangelogError> {
  document
    .released()
    .max_by(|a, b| a.version.cmp(&b.version))
    .ok_or(ChangelogError::EmptyChangelog { path: None })
}

/// Canonical rendering of the latest version
pub fn release_version_string(document: &ChangelogDocument) -> Result<String, ChangelogError> {
  let entry = latest_version(document)?;
  Ok(
    entry
      .version
      .as_ref()
      .map(ToString::to_string)
      .unwrap_or_default(),
  )
}

/// Release notes embedded in package metadata: notes of the latest release,
/// followed by a pointer to the full changelog when its URL is known.
pub fn package_release_notes(document: &ChangelogDocument, changelog_url: Option<&str>) -> Result<String, ChangelogError> {
  let entry = latest_version(document)?;
  let mut notes = entry.trimmed_notes().join("\n");

  if let Some(url) = changelog_url {
    if !notes.is_empty() {
      notes.push_str("\n\n");
    }
    notes.push_str(&format!("Full changelog at {}", url));
  }

  Ok(notes)
}

/// Version and notes chosen for the current run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
  pub version: String,
  pub notes: String,
}

impl ResolvedVersion {
  /// Resolve from the changelog, optionally replacing the prerelease label
  pub fn resolve(
    document: &ChangelogDocument,
    prerelease_override: Option<&str>,
    changelog_url: Option<&str>,
  ) -> RailResult<Self> {
    let mut version = latest_version(document)?.version.clone().unwrap_or_else(|| semver::Version::new(0, 0, 0));

    if let Some(label) = prerelease_override.map(str::trim).filter(|l| !l.is_empty()) {
      version.pre = semver::Prerelease::new(label).map_err(|_| ConfigError::InvalidParameter {
        name: "prerelease".to_string(),
        value: label.to_string(),
        expected: "a semver prerelease label such as beta.1".to_string(),
      })?;
    }

    Ok(Self {
      version: version.to_string(),
      notes: package_release_notes(document, changelog_url)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::RailError;

  fn doc(text: &str) -> ChangelogDocument {
    ChangelogDocument::parse(text).unwrap()
  }

  #[test]
  fn test_prerelease_tag_on_stable_branch() {
    let ctx = BranchContext::new("main", "2.3.0-beta.4", "2.3.0");
    assert_eq!(select_prerelease_tag(&ctx, DEFAULT_STABLE_BRANCHES), "2.3.0");
  }

  #[test]
  fn test_prerelease_tag_on_feature_branch() {
    let ctx = BranchContext::new("feature/x", "2.3.0-beta.4", "2.3.0");
    assert_eq!(select_prerelease_tag(&ctx, DEFAULT_STABLE_BRANCHES), "2.3.0-beta.4");
  }

  #[test]
  fn test_prerelease_tag_custom_stable_branches() {
    let ctx = BranchContext::new("release", "1.0.0-rc.1", "1.0.0");
    let stable = vec!["release".to_string()];
    assert_eq!(select_prerelease_tag(&ctx, &stable), "1.0.0");
  }

  #[test]
  fn test_latest_version_ignores_file_order() {
    let d = doc("## [1.1.0]\n## [1.2.0]\n## [1.0.0]\n");
    let latest = latest_version(&d).unwrap();
    assert_eq!(latest.version, Some(semver::Version::new(1, 2, 0)));
  }

  #[test]
  fn test_latest_version_prerelease_precedence() {
    let d = doc("## [vNext]\n## [2.0.0-rc.1]\n## [1.9.0]\n## [2.0.0]\n");
    assert_eq!(release_version_string(&d).unwrap(), "2.0.0");
  }

  #[test]
  fn test_empty_changelog() {
    let d = doc("# Changelog\n\n## [vNext]\n- pending\n");
    assert_eq!(latest_version(&d).unwrap_err(), ChangelogError::EmptyChangelog { path: None });
  }

  #[test]
  fn test_package_release_notes() {
    let d = doc("## [1.0.0] / 2024-01-01\n\n- First\n- Second\n\n");
    assert_eq!(package_release_notes(&d, None).unwrap(), "- First\n- Second");
    assert_eq!(
      package_release_notes(&d, Some("https://example.com/CHANGELOG.md")).unwrap(),
      "- First\n- Second\n\nFull changelog at https://example.com/CHANGELOG.md"
    );
  }

  #[test]
  fn test_resolve_with_prerelease_override() {
    let d = doc("## [1.4.0]\n- x\n");

    let resolved = ResolvedVersion::resolve(&d, None, None).unwrap();
    assert_eq!(resolved.version, "1.4.0");

    let resolved = ResolvedVersion::resolve(&d, Some("beta.2"), None).unwrap();
    assert_eq!(resolved.version, "1.4.0-beta.2");
    assert_eq!(resolved.notes, "- x");

    let err = ResolvedVersion::resolve(&d, Some("bad label!"), None).unwrap_err();
    assert!(matches!(err, RailError::Config(_)));
  }
}
