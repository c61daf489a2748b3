//! Solution and project discovery
//!
//! Reads the `Project(...)` lines of a `.sln` file and the target framework
//! properties of each project file. No MSBuild evaluation: conditional or
//! imported framework properties are not seen.

use crate::core::error::{RailError, RailResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// A project referenced by the solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  pub name: String,
  /// Absolute path to the project file
  pub path: PathBuf,
}

impl Project {
  /// Frameworks from `<TargetFramework>` or `<TargetFrameworks>`
  pub fn target_frameworks(&self) -> RailResult<Vec<String>> {
    let content = fs::read_to_string(&self.path)
      .with_context(|| format!("Failed to read project {}", self.path.display()))?;
    Ok(parse_target_frameworks(&content))
  }
}

/// A solution file and the projects it lists
#[derive(Debug, Clone)]
pub struct Solution {
  pub path: PathBuf,
  pub projects: Vec<Project>,
}

impl Solution {
  /// Load the configured solution, or the single `.sln` in `root`
  pub fn discover(root: &Path, configured: Option<&Path>) -> RailResult<Self> {
    let path = match configured {
      Some(path) => root.join(path),
      None => find_solution(root)?,
    };

    let content =
      fs::read_to_string(&path).with_context(|| format!("Failed to read solution {}", path.display()))?;
    let base = path.parent().unwrap_or(root);

    Ok(Self {
      projects: parse_projects(&content, base),
      path,
    })
  }

  /// Projects whose name ends with the test suffix
  pub fn test_projects<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a Project> + 'a {
    self.projects.iter().filter(move |p| p.name.ends_with(suffix))
  }

  /// Projects whose name contains none of the excluded fragments
  pub fn packable_projects<'a, S: AsRef<str>>(&'a self, exclude: &'a [S]) -> impl Iterator<Item = &'a Project> + 'a {
    self
      .projects
      .iter()
      .filter(move |p| !exclude.iter().any(|e| p.name.contains(e.as_ref())))
  }
}

fn find_solution(root: &Path) -> RailResult<PathBuf> {
  let mut found: Vec<PathBuf> = fs::read_dir(root)
    .with_context(|| format!("Failed to list {}", root.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.extension().is_some_and(|ext| ext == "sln"))
    .collect();
  found.sort();

  match found.len() {
    0 => Err(RailError::with_help(
      format!("No solution file found in {}", root.display()),
      "Set package.solution in buildrail.toml",
    )),
    1 => Ok(found.remove(0)),
    _ => Err(RailError::with_help(
      format!("Multiple solution files found in {}", root.display()),
      "Set package.solution in buildrail.toml to pick one",
    )),
  }
}

/// Parse `Project("{type}") = "Name", "rel\path.csproj", "{guid}"` lines.
///
/// Solution folders (entries whose path has no `*proj` extension) are skipped.
fn parse_projects(content: &str, base: &Path) -> Vec<Project> {
  content
    .lines()
    .filter_map(|line| {
      let line = line.trim();
      let rest = line.strip_prefix("Project(")?;
      let (_, values) = rest.split_once('=')?;
      let mut fields = values.split(',').map(|f| f.trim().trim_matches('"'));
      let name = fields.next()?;
      let relative = fields.next()?.replace('\\', "/");

      let is_project = Path::new(&relative)
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().ends_with("proj"));
      is_project.then(|| Project {
        name: name.to_string(),
        path: base.join(relative),
      })
    })
    .collect()
}

fn parse_target_frameworks(content: &str) -> Vec<String> {
  for tag in ["TargetFrameworks", "TargetFramework"] {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    if let Some(start) = content.find(&open)
      && let Some(len) = content[start + open.len()..].find(&close)
    {
      let value = &content[start + open.len()..start + open.len() + len];
      return value
        .split(';')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    }
  }
  Vec::new()
}

#[cfg(test)]
mod tests {
  use super::*;

  const SLN: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{2150E333-8FDC-42A3-9474-1A3956D46DE8}") = "build", "build", "{11111111-0000-0000-0000-000000000000}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Widgets", "src\Widgets\Widgets.csproj", "{22222222-0000-0000-0000-000000000000}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "Widgets.Tests", "src\Widgets.Tests\Widgets.Tests.csproj", "{33333333-0000-0000-0000-000000000000}"
EndProject
Project("{9A19103F-16F7-4668-BE54-9A1E7A4F7556}") = "_build", "build\_build.csproj", "{44444444-0000-0000-0000-000000000000}"
EndProject
"#;

  #[test]
  fn test_parse_projects_skips_folders() {
    let projects = parse_projects(SLN, Path::new("/repo"));
    let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Widgets", "Widgets.Tests", "_build"]);
    assert_eq!(projects[0].path, PathBuf::from("/repo/src/Widgets/Widgets.csproj"));
  }

  #[test]
  fn test_project_filters() {
    let solution = Solution {
      path: PathBuf::from("/repo/Widgets.sln"),
      projects: parse_projects(SLN, Path::new("/repo")),
    };

    let tests: Vec<&str> = solution.test_projects(".Tests").map(|p| p.name.as_str()).collect();
    assert_eq!(tests, vec!["Widgets.Tests"]);

    let exclude = ["Test", "_build"];
    let packable: Vec<&str> = solution.packable_projects(&exclude).map(|p| p.name.as_str()).collect();
    assert_eq!(packable, vec!["Widgets"]);
  }

  #[test]
  fn test_target_frameworks() {
    assert_eq!(
      parse_target_frameworks("<PropertyGroup><TargetFramework>net8.0</TargetFramework></PropertyGroup>"),
      vec!["net8.0"]
    );
    assert_eq!(
      parse_target_frameworks("<TargetFrameworks>net6.0; net8.0;</TargetFrameworks>"),
      vec!["net6.0", "net8.0"]
    );
    assert!(parse_target_frameworks("<Project />").is_empty());
  }

  #[test]
  fn test_discover_single_solution() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Widgets.sln"), SLN).unwrap();

    let solution = Solution::discover(dir.path(), None).unwrap();
    assert_eq!(solution.projects.len(), 3);

    fs::write(dir.path().join("Other.sln"), "").unwrap();
    assert!(Solution::discover(dir.path(), None).is_err());
    assert!(Solution::discover(dir.path(), Some(Path::new("Other.sln"))).is_ok());
  }
}
