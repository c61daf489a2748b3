//! CLI commands for buildrail
//!
//! ## Building
//! - **run**: Execute targets in dependency order (or dry-run the plan)
//! - **plan**: Show the execution order for targets
//! - **list**: Show every registered target
//!
//! ## Releases
//! - **changelog**: Inspect, check and finalize the changelog
//! - **version**: Show the version the next build is stamped with
//!
//! ## Setup
//! - **init**: Write a default buildrail.toml

pub mod changelog;
pub mod init;
pub mod list;
pub mod run;
pub mod version;

pub use changelog::{run_changelog_check, run_changelog_finalize, run_changelog_latest, run_changelog_notes};
pub use init::run_init;
pub use list::run_list;
pub use run::{run_plan, run_targets};
pub use version::run_version;
