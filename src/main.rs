mod commands;
mod core;
mod graph;
mod release;
mod targets;
mod tools;

use clap::{Args, Parser, Subcommand};
use core::ci::CiEnvironment;
use core::config::{Configuration, PipelineConfig};
use core::context::{API_KEY_VAR, BuildContext, BuildParameters};
use core::error::{RailError, RailResult, print_error};
use release::changelog::ChangelogFile;
use std::path::{Path, PathBuf};
use tools::Tools;
use tracing_subscriber::EnvFilter;

/// Dependency-ordered build targets with changelog-driven versioning
#[derive(Parser)]
#[command(name = "buildrail")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Enable debug logging (overrides RUST_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Parameters that shape a build
#[derive(Args)]
struct BuildArgs {
  /// Build configuration (default: debug locally, release on CI)
  #[arg(long, value_parser = parse_configuration)]
  configuration: Option<Configuration>,

  /// Replace the prerelease label of the package version (e.g. beta.1)
  #[arg(long)]
  prerelease: Option<String>,

  /// Package feed to publish to
  #[arg(long)]
  source: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Building
  // ============================================================================
  /// Run targets and everything they depend on
  Run {
    /// Targets to run (default: CreatePackage)
    targets: Vec<String>,
    #[command(flatten)]
    build: BuildArgs,
    /// Show the execution plan without running anything
    #[arg(long)]
    dry_run: bool,
    /// Output the plan or run report in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show the execution order for targets
  Plan {
    /// Targets to plan (default: CreatePackage)
    targets: Vec<String>,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// List every registered target
  List {
    /// Output targets in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Releases
  // ============================================================================
  /// Inspect and finalize the changelog
  #[command(subcommand)]
  Changelog(ChangelogCommands),

  /// Show the version the next build is stamped with
  Version {
    #[command(flatten)]
    build: BuildArgs,
    /// Output version information in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Setup
  // ============================================================================
  /// Write a default buildrail.toml
  Init {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
  },
}

#[derive(Subcommand)]
enum ChangelogCommands {
  /// Show the latest released version
  Latest {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Print the notes of a release (default: latest)
  Notes {
    /// Version whose notes to print
    #[arg(value_name = "VERSION")]
    release: Option<String>,
  },

  /// Stamp the unreleased section with a version and date
  Finalize {
    /// Version to release (e.g. 1.4.0)
    #[arg(value_name = "VERSION")]
    release: String,
    /// Release date as YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<String>,
    /// Do not open a new unreleased section afterwards
    #[arg(long)]
    no_reopen: bool,
  },

  /// Validate the changelog
  Check,
}

fn parse_configuration(value: &str) -> Result<Configuration, String> {
  value.parse::<Configuration>().map_err(|e| e.to_string())
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Logs go to stderr; stdout carries command results only
fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("buildrail=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("buildrail=info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let workspace_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  if let Err(err) = dispatch(cli.command, &workspace_root) {
    handle_error(err);
  }
}

fn dispatch(command: Commands, root: &Path) -> RailResult<()> {
  match command {
    Commands::Run {
      targets,
      build,
      dry_run,
      json,
    } => {
      let ctx = load_context(root, build)?;
      commands::run_targets(&ctx, targets, dry_run, json)
    }
    Commands::Plan { targets, json } => commands::run_plan(targets, json),
    Commands::List { json } => commands::run_list(json),

    Commands::Changelog(changelog_cmd) => {
      let changelog = changelog_file(root)?;
      match changelog_cmd {
        ChangelogCommands::Latest { json } => commands::run_changelog_latest(&changelog, json),
        ChangelogCommands::Notes { release } => commands::run_changelog_notes(&changelog, release),
        ChangelogCommands::Finalize {
          release,
          date,
          no_reopen,
        } => commands::run_changelog_finalize(&changelog, release, date, !no_reopen),
        ChangelogCommands::Check => commands::run_changelog_check(&changelog),
      }
    }
    Commands::Version { build, json } => commands::run_version(&load_context(root, build)?, json),

    Commands::Init { force } => commands::run_init(root, force),
  }
}

/// Build the context once: config, CI environment, parameters, tool adapters
fn load_context(root: &Path, args: BuildArgs) -> RailResult<BuildContext> {
  let config = PipelineConfig::load(root)?;
  let ci = CiEnvironment::from_env()?;

  let mut parameters = BuildParameters::from_config(&config, &ci);
  if let Some(configuration) = args.configuration {
    parameters.configuration = configuration;
  }
  parameters.prerelease = args.prerelease;
  if let Some(source) = args.source {
    parameters.source = source;
  }
  parameters.api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty());

  tracing::debug!(
    root = %root.display(),
    build_number = ci.build_number,
    is_ci = ci.is_ci,
    configuration = %parameters.configuration,
    "build context loaded"
  );

  Ok(BuildContext::new(root, config, parameters, ci, Tools::system(root)))
}

fn changelog_file(root: &Path) -> RailResult<ChangelogFile> {
  let config = PipelineConfig::load(root)?;
  let path: PathBuf = root.join(&config.paths.changelog);
  Ok(ChangelogFile::new(path))
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
