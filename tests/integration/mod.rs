//! Integration tests driving the buildrail binary

mod helpers;
mod test_changelog;
mod test_init;
mod test_run;
mod test_targets;
mod test_version;
