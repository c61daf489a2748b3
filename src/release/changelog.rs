//! Structured changelog model: parse, serialize, finalize
//!
//! A changelog is a sequence of `## ` sections. Each heading is either the
//! unreleased placeholder or a bracketed semantic version with an optional date:
//!
//! ```text
//! # Changelog
//!
//! ## [vNext]
//! - Upcoming change
//!
//! ## [1.2.0] / 2024-03-01
//! - Released change
//!
//! [vNext]: https://github.com/org/repo/compare/1.2.0...HEAD
//! ```
//!
//! Everything that is not a heading is kept verbatim, so a well-formed file
//! survives `parse` + `serialize` byte for byte. Headings are parsed with winnow
//! (not regex) and every failure is reported with its line number.

use crate::core::error::{ChangelogError, RailError, RailResult, ResultExt};
use chrono::NaiveDate;
use semver::Version;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use winnow::prelude::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Heading conventions, detected per document and reused on serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
  /// `## [vNext]` and `## [1.2.0] / 2024-03-01`
  #[default]
  VNext,
  /// `## [Unreleased]` and `## [1.2.0] - 2024-03-01`
  KeepAChangelog,
}

impl HeadingStyle {
  fn placeholder(self) -> &'static str {
    match self {
      HeadingStyle::VNext => "vNext",
      HeadingStyle::KeepAChangelog => "Unreleased",
    }
  }

  fn date_separator(self) -> char {
    match self {
      HeadingStyle::VNext => '/',
      HeadingStyle::KeepAChangelog => '-',
    }
  }
}

/// Line terminator of a document, detected from its first line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
  #[default]
  Lf,
  CrLf,
}

impl LineEnding {
  fn detect(text: &str) -> Self {
    match text.find('\n') {
      Some(index) if text[..index].ends_with('\r') => LineEnding::CrLf,
      _ => LineEnding::Lf,
    }
  }

  fn as_str(self) -> &'static str {
    match self {
      LineEnding::Lf => "\n",
      LineEnding::CrLf => "\r\n",
    }
  }
}

/// One changelog section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
  /// `None` for the unreleased placeholder
  pub version: Option<Version>,
  pub date: Option<NaiveDate>,
  /// Lines between this heading and the next, verbatim (blank lines included)
  pub notes: Vec<String>,
}

impl ReleaseEntry {
  /// An empty unreleased section
  pub fn unreleased() -> Self {
    Self {
      version: None,
      date: None,
      notes: Vec::new(),
    }
  }

  /// A released section with the given notes
  pub fn released(version: Version, date: Option<NaiveDate>, notes: Vec<String>) -> Self {
    Self {
      version: Some(version),
      date,
      notes,
    }
  }

  pub fn is_unreleased(&self) -> bool {
    self.version.is_none()
  }

  /// Note lines without the blank lines that separate sections
  pub fn trimmed_notes(&self) -> Vec<String> {
    let start = self.notes.iter().position(|l| !l.trim().is_empty());
    let end = self.notes.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
      (Some(start), Some(end)) => self.notes[start..=end].to_vec(),
      _ => Vec::new(),
    }
  }

  fn heading(&self, style: HeadingStyle) -> String {
    match (&self.version, &self.date) {
      (None, _) => format!("## [{}]", style.placeholder()),
      (Some(version), None) => format!("## [{}]", version),
      (Some(version), Some(date)) => format!(
        "## [{}] {} {}",
        version,
        style.date_separator(),
        date.format(DATE_FORMAT)
      ),
    }
  }
}

/// A whole changelog file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangelogDocument {
  /// Lines before the first section (title, intro text)
  pub preamble: Vec<String>,
  /// Sections in file order
  pub entries: Vec<ReleaseEntry>,
  /// Trailing link reference definitions (`[1.2.0]: https://...`)
  pub links: Vec<String>,
  pub style: HeadingStyle,
  pub line_ending: LineEnding,
}

/// Parsed form of a `## ` heading line
struct Heading<'s> {
  label: &'s str,
  date: Option<(char, &'s str)>,
}

fn heading<'s>(input: &mut &'s str) -> winnow::ModalResult<Heading<'s>> {
  use winnow::ascii::space0;
  use winnow::combinator::{alt, delimited, opt, preceded};
  use winnow::token::{one_of, rest, take_till};

  let label = alt((
    delimited('[', take_till(1.., ']'), ']'),
    take_till(1.., [' ', '\t']),
  ))
  .parse_next(input)?;

  let date = opt(preceded(space0, (one_of(['/', '-']), preceded(space0, rest)))).parse_next(input)?;

  Ok(Heading { label, date })
}

fn is_placeholder(label: &str) -> bool {
  label.eq_ignore_ascii_case("vnext") || label.eq_ignore_ascii_case("unreleased")
}

/// `[label]: target` at the start of a line
fn is_link_definition(line: &str) -> bool {
  line.starts_with('[') && line.contains("]: ")
}

impl ChangelogDocument {
  /// Parse changelog text into sections
  pub fn parse(text: &str) -> Result<Self, ChangelogError> {
    let mut preamble = Vec::new();
    let mut entries: Vec<ReleaseEntry> = Vec::new();
    let mut style = None;

    for (index, line) in text.lines().enumerate() {
      let line_no = index + 1;
      let malformed = |reason: String| ChangelogError::Malformed {
        path: None,
        line: line_no,
        reason,
      };

      let Some(raw_heading) = line.strip_prefix("## ") else {
        match entries.last_mut() {
          Some(entry) => entry.notes.push(line.to_string()),
          None => preamble.push(line.to_string()),
        }
        continue;
      };

      let parsed = heading
        .parse(raw_heading.trim())
        .map_err(|_| malformed(format!("unrecognized section heading '{}'", line)))?;

      let entry = if is_placeholder(parsed.label) {
        if parsed.date.is_some() {
          return Err(malformed("the unreleased section cannot carry a date".to_string()));
        }
        style.get_or_insert(if parsed.label.eq_ignore_ascii_case("vnext") {
          HeadingStyle::VNext
        } else {
          HeadingStyle::KeepAChangelog
        });
        ReleaseEntry::unreleased()
      } else {
        let version = Version::parse(parsed.label)
          .map_err(|e| malformed(format!("invalid version '{}': {}", parsed.label, e)))?;

        if entries.iter().any(|e| e.version.as_ref() == Some(&version)) {
          return Err(malformed(format!("duplicate section for version {}", version)));
        }

        let date = match parsed.date {
          Some((separator, raw_date)) => {
            style.get_or_insert(if separator == '/' {
              HeadingStyle::VNext
            } else {
              HeadingStyle::KeepAChangelog
            });
            let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT)
              .map_err(|e| malformed(format!("invalid date '{}': {}", raw_date.trim(), e)))?;
            Some(date)
          }
          None => None,
        };

        ReleaseEntry {
          version: Some(version),
          date,
          notes: Vec::new(),
        }
      };

      entries.push(entry);
    }

    let links = match entries.last_mut() {
      Some(last) => split_link_footer(&mut last.notes),
      None => Vec::new(),
    };

    Ok(Self {
      preamble,
      entries,
      links,
      style: style.unwrap_or_default(),
      line_ending: LineEnding::detect(text),
    })
  }

  /// Render the document back to text (always newline-terminated)
  pub fn serialize(&self) -> String {
    let mut lines: Vec<String> = self.preamble.clone();
    for entry in &self.entries {
      lines.push(entry.heading(self.style));
      lines.extend(entry.notes.iter().cloned());
    }
    lines.extend(self.links.iter().cloned());
    if lines.is_empty() {
      return String::new();
    }

    let ending = self.line_ending.as_str();
    let mut output = lines.join(ending);
    output.push_str(ending);
    output
  }

  /// Index of the first unreleased section
  pub fn unreleased_index(&self) -> Option<usize> {
    self.entries.iter().position(ReleaseEntry::is_unreleased)
  }

  /// Released sections only
  pub fn released(&self) -> impl Iterator<Item = &ReleaseEntry> {
    self.entries.iter().filter(|e| !e.is_unreleased())
  }

  /// Find the section for a version
  pub fn find(&self, version: &Version) -> Option<&ReleaseEntry> {
    self.entries.iter().find(|e| e.version.as_ref() == Some(version))
  }

  /// Stamp the first unreleased section with `version` and `date`.
  ///
  /// Every other section is left untouched. When several sections are
  /// unreleased, only the first one is finalized.
  pub fn finalize(mut self, version: &Version, date: NaiveDate) -> Result<Self, ChangelogError> {
    let index = self
      .unreleased_index()
      .ok_or(ChangelogError::NoUnreleasedSection { path: None })?;

    if self.find(version).is_some() {
      return Err(ChangelogError::VersionExists {
        path: None,
        version: version.to_string(),
      });
    }

    let entry = &mut self.entries[index];
    entry.version = Some(version.clone());
    entry.date = Some(date);
    Ok(self)
  }

  /// Insert a fresh, empty unreleased section above every other section
  pub fn reopen_unreleased(mut self) -> Self {
    let mut entry = ReleaseEntry::unreleased();
    entry.notes.push(String::new());
    self.entries.insert(0, entry);
    self
  }

  /// Note lines of one section (`None` = the highest released version)
  pub fn extract_section_notes(&self, version: Option<&Version>) -> Option<Vec<String>> {
    let entry = match version {
      Some(version) => self.find(version)?,
      None => self.released().max_by(|a, b| a.version.cmp(&b.version))?,
    };
    Some(entry.trimmed_notes())
  }

  /// Whether released sections appear newest-first by semver precedence
  pub fn is_ordered(&self) -> bool {
    let versions: Vec<&Version> = self.released().filter_map(|e| e.version.as_ref()).collect();
    versions.windows(2).all(|pair| pair[0] > pair[1])
  }
}

impl fmt::Display for ChangelogDocument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.serialize())
  }
}

/// Move the trailing block of link definitions out of the last section
fn split_link_footer(notes: &mut Vec<String>) -> Vec<String> {
  let mut start = notes.len();
  for (index, line) in notes.iter().enumerate().rev() {
    if line.trim().is_empty() {
      continue;
    }
    if is_link_definition(line) {
      start = index;
    } else {
      break;
    }
  }
  notes.split_off(start)
}

/// A changelog on disk; all errors name the file
#[derive(Debug, Clone)]
pub struct ChangelogFile {
  path: PathBuf,
}

impl ChangelogFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read and parse the file (fresh on every call)
  pub fn load(&self) -> RailResult<ChangelogDocument> {
    let text = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read changelog from {}", self.path.display()))?;
    ChangelogDocument::parse(&text).map_err(|e| e.with_path(&self.path).into())
  }

  pub fn save(&self, document: &ChangelogDocument) -> RailResult<()> {
    fs::write(&self.path, document.serialize())
      .with_context(|| format!("Failed to write changelog to {}", self.path.display()))
  }

  /// Load, finalize the unreleased section and write it back
  pub fn finalize(&self, version: &Version, date: NaiveDate, reopen: bool) -> RailResult<ChangelogDocument> {
    let document = self
      .load()?
      .finalize(version, date)
      .map_err(|e| RailError::from(e.with_path(&self.path)))?;
    let document = if reopen { document.reopen_unreleased() } else { document };
    self.save(&document)?;
    Ok(document)
  }
}
