//! Release versioning driven by the changelog
//!
//! # Core Invariants
//!
//! 1. **The changelog is the single source of truth for versions**
//!    - Artifacts are stamped with the highest released version in the changelog
//!    - Release notes embedded in packages come from the same section
//!
//! 2. **Branch context only affects finalization**
//!    - Stable branches (`main`, `master`) finalize with `major.minor.patch`
//!    - Every other branch keeps its prerelease metadata
//!
//! 3. **The changelog is loaded fresh each time it is needed**
//!    - No cross-run caching; targets that rewrite it see their own changes
//!
//! # Architecture
//!
//! - **changelog**: `ChangelogDocument` parse/serialize/finalize, `ChangelogFile` I/O
//! - **version**: `BranchContext`, prerelease tag selection, latest version, `ResolvedVersion`

pub mod changelog;
pub mod version;
