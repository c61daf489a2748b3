//! `dotnet` CLI adapter
//!
//! Settings structs render to argument lists so the exact invocation can be
//! checked without the SDK installed.

use super::{DotNet, run};
use crate::core::config::Configuration;
use crate::core::error::RailResult;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Compile a solution or project with version stamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
  pub target: PathBuf,
  pub configuration: Configuration,
  pub assembly_version: String,
  pub file_version: String,
  pub informational_version: String,
  pub restore: bool,
}

impl BuildSettings {
  pub fn arguments(&self) -> Vec<String> {
    let mut args = vec![
      "build".to_string(),
      self.target.display().to_string(),
      "--configuration".to_string(),
      self.configuration.to_string(),
      format!("-p:AssemblyVersion={}", self.assembly_version),
      format!("-p:FileVersion={}", self.file_version),
      format!("-p:InformationalVersion={}", self.informational_version),
    ];
    if !self.restore {
      args.push("--no-restore".to_string());
    }
    args
  }
}

/// Run one test project against one target framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSettings {
  pub project: PathBuf,
  pub configuration: Configuration,
  pub framework: String,
  pub results_directory: PathBuf,
  /// Logger argument, e.g. `trx;LogFileName=Lib.Tests-net8.0.trx`
  pub logger: String,
  pub build: bool,
}

impl TestSettings {
  pub fn arguments(&self) -> Vec<String> {
    let mut args = vec![
      "test".to_string(),
      self.project.display().to_string(),
      "--configuration".to_string(),
      self.configuration.to_string(),
      "--framework".to_string(),
      self.framework.clone(),
      "--logger".to_string(),
      self.logger.clone(),
      "--results-directory".to_string(),
      self.results_directory.display().to_string(),
    ];
    if !self.build {
      args.push("--no-build".to_string());
    }
    args
  }

  /// Directory the test run executes in (the project's own folder).
  /// Callers pass absolute paths so the other arguments stay valid there.
  pub fn working_directory(&self) -> Option<&Path> {
    self.project.parent().filter(|p| !p.as_os_str().is_empty())
  }
}

/// Produce a package with version and release notes metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSettings {
  pub project: PathBuf,
  pub configuration: Configuration,
  pub version: String,
  pub release_notes: String,
  pub description: Option<String>,
  pub project_url: Option<String>,
  pub output_directory: PathBuf,
  pub include_symbols: bool,
  pub build: bool,
}

impl PackSettings {
  pub fn arguments(&self) -> Vec<String> {
    let mut args = vec![
      "pack".to_string(),
      self.project.display().to_string(),
      "--configuration".to_string(),
      self.configuration.to_string(),
      "--output".to_string(),
      self.output_directory.display().to_string(),
      format!("-p:PackageVersion={}", self.version),
      format!("-p:PackageReleaseNotes={}", escape_msbuild(&self.release_notes)),
    ];
    if let Some(ref description) = self.description {
      args.push(format!("-p:Description={}", escape_msbuild(description)));
    }
    if let Some(ref url) = self.project_url {
      args.push(format!("-p:PackageProjectUrl={}", url));
    }
    if self.include_symbols {
      args.push("--include-symbols".to_string());
    }
    if !self.build {
      args.push("--no-build".to_string());
      args.push("--no-restore".to_string());
    }
    args
  }
}

/// Publish a package to a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSettings {
  pub package: PathBuf,
  pub source: String,
  pub api_key: Option<String>,
}

impl PushSettings {
  pub fn arguments(&self) -> Vec<String> {
    let mut args = vec![
      "nuget".to_string(),
      "push".to_string(),
      self.package.display().to_string(),
      "--source".to_string(),
      self.source.clone(),
    ];
    if let Some(ref key) = self.api_key {
      args.push("--api-key".to_string());
      args.push(key.clone());
    }
    args
  }
}

/// MSBuild property values treat `;` and `,` as list separators
fn escape_msbuild(value: &str) -> String {
  value
    .replace('%', "%25")
    .replace(';', "%3B")
    .replace(',', "%2C")
    .replace('\r', "")
    .replace('\n', "%0A")
}

/// `dotnet` from PATH, run from the workspace root
pub struct DotNetCli {
  root: PathBuf,
}

impl DotNetCli {
  pub fn new(root: &Path) -> Self {
    Self {
      root: root.to_path_buf(),
    }
  }

  fn command(&self, args: Vec<String>) -> Command {
    let mut cmd = Command::new("dotnet");
    cmd.current_dir(&self.root).args(args);
    cmd.env("DOTNET_CLI_TELEMETRY_OPTOUT", "1");
    cmd.env("DOTNET_NOLOGO", "1");
    cmd
  }
}

impl DotNet for DotNetCli {
  fn restore(&self, solution: &Path) -> RailResult<()> {
    run(self.command(vec!["restore".to_string(), solution.display().to_string()]))
  }

  fn build(&self, settings: &BuildSettings) -> RailResult<()> {
    run(self.command(settings.arguments()))
  }

  fn test(&self, settings: &TestSettings) -> RailResult<()> {
    let mut cmd = self.command(settings.arguments());
    if let Some(dir) = settings.working_directory() {
      cmd.current_dir(self.root.join(dir));
    }
    run(cmd)
  }

  fn pack(&self, settings: &PackSettings) -> RailResult<()> {
    run(self.command(settings.arguments()))
  }

  fn push(&self, settings: &PushSettings) -> RailResult<()> {
    run(self.command(settings.arguments()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_build_arguments() {
    let settings = BuildSettings {
      target: PathBuf::from("Widgets.sln"),
      configuration: Configuration::Release,
      assembly_version: "1.2.0".to_string(),
      file_version: "1.2.0".to_string(),
      informational_version: "1.2.0-beta.1".to_string(),
      restore: false,
    };

    assert_eq!(
      settings.arguments(),
      vec![
        "build",
        "Widgets.sln",
        "--configuration",
        "Release",
        "-p:AssemblyVersion=1.2.0",
        "-p:FileVersion=1.2.0",
        "-p:InformationalVersion=1.2.0-beta.1",
        "--no-restore",
      ]
    );
  }

  #[test]
  fn test_test_arguments() {
    let settings = TestSettings {
      project: PathBuf::from("tests/Lib.Tests/Lib.Tests.csproj"),
      configuration: Configuration::Debug,
      framework: "net8.0".to_string(),
      results_directory: PathBuf::from("TestResults"),
      logger: "trx;LogFileName=Lib.Tests-net8.0.trx".to_string(),
      build: false,
    };

    let args = settings.arguments();
    assert_eq!(args[1], "tests/Lib.Tests/Lib.Tests.csproj");
    assert_eq!(args[9], "TestResults");
    assert!(args.contains(&"--framework".to_string()));
    assert_eq!(args.last().map(String::as_str), Some("--no-build"));
    assert_eq!(settings.working_directory(), Some(Path::new("tests/Lib.Tests")));
  }

  #[test]
  fn test_pack_arguments_escape_notes() {
    let settings = PackSettings {
      project: PathBuf::from("src/Lib/Lib.csproj"),
      configuration: Configuration::Release,
      version: "2.0.0".to_string(),
      release_notes: "- Fix a; b\n- Add c, d".to_string(),
      description: None,
      project_url: Some("https://example.com".to_string()),
      output_directory: PathBuf::from("bin/nuget"),
      include_symbols: true,
      build: false,
    };

    let args = settings.arguments();
    assert!(args.contains(&"-p:PackageVersion=2.0.0".to_string()));
    assert!(args.contains(&"-p:PackageReleaseNotes=- Fix a%3B b%0A- Add c%2C d".to_string()));
    assert!(args.contains(&"-p:PackageProjectUrl=https://example.com".to_string()));
    assert!(args.contains(&"--include-symbols".to_string()));
    assert!(args.contains(&"--no-restore".to_string()));
  }

  #[test]
  fn test_push_arguments() {
    let settings = PushSettings {
      package: PathBuf::from("bin/nuget/Lib.2.0.0.nupkg"),
      source: "https://feed.example.com".to_string(),
      api_key: None,
    };
    assert_eq!(
      settings.arguments(),
      vec!["nuget", "push", "bin/nuget/Lib.2.0.0.nupkg", "--source", "https://feed.example.com"]
    );
  }
}
