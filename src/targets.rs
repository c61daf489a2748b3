//! Standard target set for a .NET library
//!
//! ```text
//! Clean ┄┄before┄┄▶ Restore ──▶ Compile ──▶ CreatePackage ──▶ Publish
//!                                  │ ┄after┄▶ RunTests ──▶─┘
//!                                  └──▶ CreateMetadata ──▶ DocFx ──▶ ServeDocs
//! RunChangelog (standalone)
//! ```
//!
//! Solid arrows are hard dependencies, dotted ones soft hints. Bodies read the
//! changelog fresh each time they need a version.

use crate::core::context::BuildContext;
use crate::core::error::{RailError, RailResult, ResultExt};
use crate::graph::{Target, TargetGraph};
use crate::release::version::select_prerelease_tag;
use crate::tools::{BuildSettings, PackSettings, PushSettings, TestSettings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Target run when none is named
pub const DEFAULT_TARGET: &str = "CreatePackage";

/// Register every standard target and validate the graph
pub fn standard_targets() -> RailResult<TargetGraph<BuildContext>> {
  let mut graph = TargetGraph::new();

  graph.register(
    Target::new("Clean")
      .description("Delete build outputs, test results and the docs site")
      .before(["Restore"])
      .executes(|ctx: &BuildContext| {
        let removed = clean(ctx)?;
        info!(directories = removed.len(), "cleaned");
        Ok(())
      }),
  )?;

  graph.register(
    Target::new("Restore")
      .description("Restore package dependencies")
      .executes(|ctx: &BuildContext| {
        let solution = ctx.solution()?;
        ctx.tools.dotnet.restore(&solution.path)
      }),
  )?;

  graph.register(
    Target::new("Compile")
      .description("Build the solution stamped with the changelog version")
      .depends_on(["Restore"])
      .executes(compile),
  )?;

  graph.register(
    Target::new("RunTests")
      .description("Run every test project for each target framework")
      .after(["Compile"])
      .executes(run_tests),
  )?;

  graph.register(
    Target::new("CreatePackage")
      .description("Pack library projects with version and release notes")
      .depends_on(["Compile", "RunTests"])
      .executes(create_packages),
  )?;

  graph.register(
    Target::new("Publish")
      .description("Push packages to the feed (needs an API key)")
      .depends_on(["CreatePackage"])
      .only_when(|ctx: &BuildContext| ctx.parameters.api_key.is_some())
      .executes(publish),
  )?;

  graph.register(
    Target::new("RunChangelog")
      .description("Finalize the changelog for this branch, commit and tag")
      .executes(finalize_changelog),
  )?;

  graph.register(
    Target::new("CreateMetadata")
      .description("Extract API metadata for the docs")
      .depends_on(["Compile"])
      .executes(|ctx: &BuildContext| ctx.tools.docs.metadata(&docfx_config(ctx))),
  )?;

  graph.register(
    Target::new("DocFx")
      .description("Build the documentation site")
      .depends_on(["CreateMetadata"])
      .executes(|ctx: &BuildContext| ctx.tools.docs.build(&docfx_config(ctx))),
  )?;

  graph.register(
    Target::new("ServeDocs")
      .description("Serve the documentation site locally")
      .depends_on(["DocFx"])
      .executes(|ctx: &BuildContext| ctx.tools.docs.serve(&ctx.path(&ctx.config.paths.docs_site))),
  )?;

  graph.validate()?;
  Ok(graph)
}

fn docfx_config(ctx: &BuildContext) -> PathBuf {
  ctx.path(&ctx.config.paths.docs).join("docfx.json")
}

/// Remove `bin`/`obj` under the source tree and every output directory,
/// then recreate an empty output directory.
fn clean(ctx: &BuildContext) -> RailResult<Vec<PathBuf>> {
  let paths = &ctx.config.paths;
  let mut targets = Vec::new();
  collect_build_dirs(&ctx.path(&paths.source), &mut targets)?;
  targets.extend(
    [
      &paths.output,
      &paths.test_results,
      &paths.perf_results,
      &paths.packages,
      &paths.docs_site,
    ]
    .into_iter()
    .map(|p| ctx.path(p)),
  );

  let mut removed = Vec::new();
  for dir in targets {
    if dir.is_dir() {
      fs::remove_dir_all(&dir).with_context(|| format!("Failed to delete {}", dir.display()))?;
      removed.push(dir);
    }
  }

  let output = ctx.path(&paths.output);
  fs::create_dir_all(&output).with_context(|| format!("Failed to create {}", output.display()))?;
  Ok(removed)
}

/// Find `bin` and `obj` directories below `dir` (without descending into them)
fn collect_build_dirs(dir: &Path, found: &mut Vec<PathBuf>) -> RailResult<()> {
  if !dir.is_dir() {
    return Ok(());
  }

  let mut entries: Vec<PathBuf> = fs::read_dir(dir)
    .with_context(|| format!("Failed to list {}", dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| p.is_dir())
    .collect();
  entries.sort();

  for entry in entries {
    let is_build_dir = entry
      .file_name()
      .is_some_and(|name| name == "bin" || name == "obj");
    if is_build_dir {
      found.push(entry);
    } else {
      collect_build_dirs(&entry, found)?;
    }
  }
  Ok(())
}

fn compile(ctx: &BuildContext) -> RailResult<()> {
  let solution = ctx.solution()?;
  let version = ctx.release_version()?;
  let numeric = format!("{}.{}.{}", version.major, version.minor, version.patch);

  info!(version = %version, configuration = %ctx.parameters.configuration, "compiling");
  ctx.tools.dotnet.build(&BuildSettings {
    target: solution.path,
    configuration: ctx.parameters.configuration,
    assembly_version: numeric.clone(),
    file_version: numeric,
    informational_version: version.to_string(),
    restore: false,
  })
}

fn run_tests(ctx: &BuildContext) -> RailResult<()> {
  let solution = ctx.solution()?;
  let results = ctx.path(&ctx.config.paths.test_results);

  for project in solution.test_projects(&ctx.config.package.test_suffix) {
    let frameworks = project.target_frameworks()?;
    if frameworks.is_empty() {
      warn!(project = %project.name, "no target framework found, skipping");
      continue;
    }

    for framework in frameworks {
      info!(project = %project.name, framework = %framework, "running tests");
      ctx.tools.dotnet.test(&TestSettings {
        project: project.path.clone(),
        configuration: ctx.parameters.configuration,
        logger: format!("trx;LogFileName={}-{}.trx", project.name, framework),
        framework,
        results_directory: results.clone(),
        build: false,
      })?;
    }
  }

  Ok(())
}

fn create_packages(ctx: &BuildContext) -> RailResult<()> {
  let solution = ctx.solution()?;
  let resolved = ctx.resolved_version()?;
  let output = ctx.path(&ctx.config.paths.packages);
  let package = &ctx.config.package;

  let mut packed = 0;
  for project in solution.packable_projects(&package.exclude) {
    info!(project = %project.name, version = %resolved.version, "packing");
    ctx.tools.dotnet.pack(&PackSettings {
      project: project.path.clone(),
      configuration: ctx.parameters.configuration,
      version: resolved.version.clone(),
      release_notes: resolved.notes.clone(),
      description: package.description.clone(),
      project_url: package.project_url.clone(),
      output_directory: output.clone(),
      include_symbols: true,
      build: false,
    })?;
    packed += 1;
  }

  if packed == 0 {
    warn!("no packable projects in {}", solution.path.display());
  }
  Ok(())
}

fn publish(ctx: &BuildContext) -> RailResult<()> {
  let dir = ctx.path(&ctx.config.paths.packages);
  let packages = find_packages(&dir)?;
  if packages.is_empty() {
    return Err(RailError::with_help(
      format!("No packages found in {}", dir.display()),
      "Run the CreatePackage target first",
    ));
  }

  for package in packages {
    info!(package = %package.display(), source = %ctx.parameters.source, "pushing");
    ctx.tools.dotnet.push(&PushSettings {
      package,
      source: ctx.parameters.source.clone(),
      api_key: ctx.parameters.api_key.clone(),
    })?;
  }
  Ok(())
}

/// `.nupkg` files in a directory, symbol packages excluded (pushed alongside)
fn find_packages(dir: &Path) -> RailResult<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut packages: Vec<PathBuf> = fs::read_dir(dir)
    .with_context(|| format!("Failed to list {}", dir.display()))?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|p| {
      let name = p.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
      name.ends_with(".nupkg") && !name.ends_with(".symbols.nupkg")
    })
    .collect();
  packages.sort();
  Ok(packages)
}

fn finalize_changelog(ctx: &BuildContext) -> RailResult<()> {
  let branch = ctx.branch_context()?;
  let next = select_prerelease_tag(&branch, &ctx.config.release.stable_branches);
  let version = semver::Version::parse(&next)
    .map_err(|e| RailError::message(format!("Version tool reported '{}', which is not semver: {}", next, e)))?;

  let changelog = ctx.changelog();
  changelog.finalize(&version, ctx.parameters.release_date, true)?;
  info!(version = %version, branch = %branch.branch, "changelog finalized");

  if !ctx.config.release.commit_on_finalize {
    return Ok(());
  }

  let file_name = changelog
    .path()
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  ctx.tools.git.add(changelog.path())?;
  ctx.tools.git.commit(&format!("Finalize {} for {}.", file_name, next))?;
  ctx.tools.git.tag(&branch.sem_ver, true)?;
  Ok(())
}
