//! Error types for buildrail with contextual messages and exit codes
//!
//! This module provides a unified error type that categorizes errors and provides
//! contextual help messages to users. Graph and changelog errors are reported before
//! any target runs; a failing target body is wrapped in `TargetExecution` so the
//! printed chain shows which target failed and which operation caused it.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for buildrail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, unknown target, malformed changelog)
  User = 1,
  /// System error (external tool, I/O)
  System = 2,
  /// A target body failed
  Build = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for buildrail
#[derive(Debug)]
pub enum RailError {
  /// Configuration errors
  Config(ConfigError),

  /// Target registration and resolution errors
  Graph(GraphError),

  /// Changelog parsing and version resolution errors
  Changelog(ChangelogError),

  /// External tool invocation errors
  Tool(ToolError),

  /// A target body failed; wraps the underlying cause
  TargetExecution { target: String, source: Box<RailError> },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Wrap the error of a failed target body
  pub fn target_failed(target: impl Into<String>, source: RailError) -> Self {
    RailError::TargetExecution {
      target: target.into(),
      source: Box::new(source),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message { message, context, help } => RailError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RailError::Io(e) => RailError::Io(io::Error::new(e.kind(), format!("{}: {}", ctx_str, e))),
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::User,
      RailError::Graph(_) => ExitCode::User,
      RailError::Changelog(_) => ExitCode::User,
      RailError::Tool(_) => ExitCode::System,
      RailError::TargetExecution { .. } => ExitCode::Build,
      RailError::Io(_) => ExitCode::System,
      RailError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Graph(e) => e.help_message(),
      RailError::Changelog(e) => e.help_message(),
      RailError::Tool(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }

  /// The innermost error of a target failure chain
  pub fn root_cause(&self) -> &RailError {
    match self {
      RailError::TargetExecution { source, .. } => source.root_cause(),
      _ => self,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Graph(e) => write!(f, "{}", e),
      RailError::Changelog(e) => write!(f, "{}", e),
      RailError::Tool(e) => write!(f, "{}", e),
      RailError::TargetExecution { target, .. } => write!(f, "Target '{}' failed", target),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      RailError::TargetExecution { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<GraphError> for RailError {
  fn from(err: GraphError) -> Self {
    RailError::Graph(err)
  }
}

impl From<ChangelogError> for RailError {
  fn from(err: ChangelogError) -> Self {
    RailError::Changelog(err)
  }
}

impl From<ToolError> for RailError {
  fn from(err: ToolError) -> Self {
    RailError::Tool(err)
  }
}

impl From<ConfigError> for RailError {
  fn from(err: ConfigError) -> Self {
    RailError::Config(err)
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for RailError {
  fn from(err: semver::Error) -> Self {
    RailError::message(format!("Invalid semantic version: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for RailError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    RailError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but fails validation
  Invalid { path: PathBuf, reason: String },

  /// Invocation parameter has an unsupported value
  InvalidParameter {
    name: String,
    value: String,
    expected: String,
  },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { path, .. } => Some(format!("Fix the configuration in {}", path.display())),
      ConfigError::InvalidParameter { name, expected, .. } => Some(format!("Pass --{} {}", name, expected)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::InvalidParameter { name, value, expected } => {
        write!(f, "Invalid value '{}' for parameter '{}' (expected {})", value, name, expected)
      }
    }
  }
}

/// Target graph errors
///
/// All of these are fatal at graph-build or invocation time, before any target runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// A target with this name is already registered
  DuplicateTarget { name: String },

  /// Hard dependencies form a cycle (first name repeated at the end)
  CyclicDependency { cycle: Vec<String> },

  /// Requested target (or a declared dependency) is not registered
  UnknownTarget {
    name: String,
    required_by: Option<String>,
    available: Vec<String>,
  },
}

impl GraphError {
  fn help_message(&self) -> Option<String> {
    match self {
      GraphError::DuplicateTarget { .. } => Some("Each target name may be registered only once.".to_string()),
      GraphError::CyclicDependency { .. } => {
        Some("Remove one of the depends_on edges in the cycle; use before/after for soft ordering.".to_string())
      }
      GraphError::UnknownTarget { available, .. } if !available.is_empty() => {
        Some(format!("Available targets: {}", available.join(", ")))
      }
      GraphError::UnknownTarget { .. } => None,
    }
  }
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::DuplicateTarget { name } => write!(f, "Target '{}' is already registered", name),
      GraphError::CyclicDependency { cycle } => {
        write!(f, "Cyclic dependency between targets: {}", cycle.join(" -> "))
      }
      GraphError::UnknownTarget { name, required_by, .. } => match required_by {
        Some(dependent) => write!(f, "Target '{}' depends on unknown target '{}'", dependent, name),
        None => write!(f, "Unknown target '{}'", name),
      },
    }
  }
}

/// Changelog errors
///
/// `path` is filled in by `ChangelogFile` when the document came from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogError {
  /// Text cannot be parsed into the expected section structure
  Malformed {
    path: Option<PathBuf>,
    line: usize,
    reason: String,
  },

  /// No section carries the unreleased placeholder
  NoUnreleasedSection { path: Option<PathBuf> },

  /// No released section exists
  EmptyChangelog { path: Option<PathBuf> },

  /// The version being finalized already has a section
  VersionExists { path: Option<PathBuf>, version: String },
}

impl ChangelogError {
  /// Attach the file the document was read from
  pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
    let file = Some(file.into());
    match self {
      ChangelogError::Malformed { line, reason, .. } => ChangelogError::Malformed { path: file, line, reason },
      ChangelogError::NoUnreleasedSection { .. } => ChangelogError::NoUnreleasedSection { path: file },
      ChangelogError::EmptyChangelog { .. } => ChangelogError::EmptyChangelog { path: file },
      ChangelogError::VersionExists { version, .. } => ChangelogError::VersionExists { path: file, version },
    }
  }

  fn path(&self) -> Option<&PathBuf> {
    match self {
      ChangelogError::Malformed { path, .. }
      | ChangelogError::NoUnreleasedSection { path }
      | ChangelogError::EmptyChangelog { path }
      | ChangelogError::VersionExists { path, .. } => path.as_ref(),
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ChangelogError::Malformed { .. } => {
        Some("Section headings look like `## [vNext]` or `## [1.2.0] / 2024-01-31`.".to_string())
      }
      ChangelogError::NoUnreleasedSection { .. } => {
        Some("Add a `## [vNext]` section with the notes for the upcoming release.".to_string())
      }
      ChangelogError::EmptyChangelog { .. } => Some("Define at least one released version.".to_string()),
      ChangelogError::VersionExists { .. } => None,
    }
  }
}

impl fmt::Display for ChangelogError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let location = self
      .path()
      .map(|p| format!(" ({})", p.display()))
      .unwrap_or_default();
    match self {
      ChangelogError::Malformed { line, reason, .. } => {
        write!(f, "Malformed changelog{} at line {}: {}", location, line, reason)
      }
      ChangelogError::NoUnreleasedSection { .. } => {
        write!(f, "Changelog{} has no unreleased section", location)
      }
      ChangelogError::EmptyChangelog { .. } => {
        write!(f, "Changelog{} defines no released version", location)
      }
      ChangelogError::VersionExists { version, .. } => {
        write!(f, "Changelog{} already has a section for {}", location, version)
      }
    }
  }
}

/// External tool errors
#[derive(Debug)]
pub enum ToolError {
  /// Program could not be spawned
  NotFound { program: String, reason: String },

  /// Program exited unsuccessfully
  CommandFailed {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// Program succeeded but its output could not be understood
  InvalidOutput { command: String, reason: String },
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    match self {
      ToolError::NotFound { program, .. } => Some(format!("Make sure `{}` is installed and on PATH.", program)),
      _ => None,
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::NotFound { program, reason } => write!(f, "Failed to execute {}: {}", program, reason),
      ToolError::CommandFailed { command, status, stderr } => {
        write!(f, "Command failed with exit code {}: {}", status.unwrap_or(-1), command)?;
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      ToolError::InvalidOutput { command, reason } => {
        write!(f, "Unexpected output from {}: {}", command, reason)
      }
    }
  }
}

/// Result type alias for buildrail
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error and its chain of causation to stderr
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}", error);

  let mut current = error;
  while let RailError::TargetExecution { source, .. } = current {
    eprintln!("   caused by: {}", source);
    current = source;
  }
  eprintln!();

  if let Some(help) = error.root_cause().help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

/// Convert anyhow::Error to RailError
impl From<anyhow::Error> for RailError {
  fn from(err: anyhow::Error) -> Self {
    RailError::message(err.to_string())
  }
}
