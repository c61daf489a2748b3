//! Core engine for buildrail
//!
//! This module contains the building blocks every command shares:
//!
//! - **ci**: CI environment detection (build number)
//! - **config**: Pipeline configuration (buildrail.toml) parsing and validation
//! - **context**: Build context resolved once and handed to every target
//! - **error**: Error types with contextual help messages and exit codes
//! - **executor**: Sequential target execution with skip/abort semantics
//! - **plan**: Execution plans for dry runs and run reports

pub mod ci;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod plan;
