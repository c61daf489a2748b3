//! `buildrail changelog`: inspect and finalize the changelog

use crate::core::error::{ChangelogError, RailError, RailResult};
use crate::release::changelog::ChangelogFile;
use crate::release::version::latest_version;
use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LatestRelease {
  version: String,
  date: Option<NaiveDate>,
  notes: Vec<String>,
}

/// Print the highest released version
pub fn run_changelog_latest(changelog: &ChangelogFile, json: bool) -> RailResult<()> {
  let document = changelog.load()?;
  let entry = latest_version(&document).map_err(|e| e.with_path(changelog.path()))?;

  let latest = LatestRelease {
    version: entry.version.as_ref().map(ToString::to_string).unwrap_or_default(),
    date: entry.date,
    notes: entry.trimmed_notes(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&latest)?);
  } else {
    match latest.date {
      Some(date) => println!("{} ({})", latest.version, date),
      None => println!("{}", latest.version),
    }
  }
  Ok(())
}

/// Print the notes of one section (latest release when no version is given)
pub fn run_changelog_notes(changelog: &ChangelogFile, version: Option<String>) -> RailResult<()> {
  let document = changelog.load()?;
  let version = version.map(|v| Version::parse(v.trim_start_matches('v'))).transpose()?;

  let notes = document.extract_section_notes(version.as_ref()).ok_or_else(|| match version {
    Some(ref v) => RailError::with_help(
      format!("Version {} not found in {}", v, changelog.path().display()),
      "Run 'buildrail changelog check' to list released versions",
    ),
    None => ChangelogError::EmptyChangelog {
      path: Some(changelog.path().to_path_buf()),
    }
    .into(),
  })?;

  for line in notes {
    println!("{}", line);
  }
  Ok(())
}

/// Stamp the unreleased section with a version and date
pub fn run_changelog_finalize(
  changelog: &ChangelogFile,
  version: String,
  date: Option<String>,
  reopen: bool,
) -> RailResult<()> {
  let version = Version::parse(version.trim_start_matches('v'))?;
  let date = match date {
    Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
      RailError::with_help(
        format!("Invalid date '{}': {}", text, e),
        "Dates use the YYYY-MM-DD format",
      )
    })?,
    None => chrono::Local::now().date_naive(),
  };

  changelog.finalize(&version, date, reopen)?;
  println!(
    "✅ Finalized {} as {} / {}",
    changelog.path().display(),
    version,
    date.format("%Y-%m-%d")
  );
  Ok(())
}

/// Validate the changelog: parses, has a release, sections newest-first
pub fn run_changelog_check(changelog: &ChangelogFile) -> RailResult<()> {
  let document = changelog.load()?;
  let latest = latest_version(&document).map_err(|e| e.with_path(changelog.path()))?;

  let released: Vec<String> = document
    .released()
    .filter_map(|e| e.version.as_ref().map(ToString::to_string))
    .collect();

  println!("📄 {}", changelog.path().display());
  println!("   Released versions: {}", released.join(", "));
  if let Some(ref version) = latest.version {
    println!("   Latest: {}", version);
  }
  if document.unreleased_index().is_some() {
    println!("   Unreleased section: present");
  } else {
    println!("   Unreleased section: none");
  }

  if !document.is_ordered() {
    println!("⚠️  Released sections are not ordered newest-first");
  }

  println!("✅ Changelog is valid");
  Ok(())
}
