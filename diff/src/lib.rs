//! Structural diffing of command-metadata snapshots.
//!
//! Compares two snapshots of a CLI module's command surface and
//! produces an ordered list of typed, breaking-classified changes:
//!
//! - [`DeepDiff`] — generic recursive diff over JSON value trees.
//! - [`PathLocator`] — typed parsing of the bracketed edit paths.
//! - [`MetaChangeDetector`] — reclassifies raw edits into
//!   [`Change`](cli_meta_core::Change) records via the rule table.
//! - [`render_changes`] — text, flat-object, or tree reports.
//!
//! # Example
//!
//! ```
//! use cli_meta_core::{Command, CommandMetaRoot};
//! use cli_meta_diff::{diff_trees, render_changes, OutputFormat, Rendered};
//!
//! let mut base = CommandMetaRoot::new("monitor");
//! base.insert_command(Command::new("monitor clone"));
//! base.insert_command(Command::new("monitor show"));
//! let mut diff = CommandMetaRoot::new("monitor");
//! diff.insert_command(Command::new("monitor show"));
//!
//! let changes = diff_trees(&base, &diff).unwrap();
//! assert_eq!(changes.len(), 1);
//! assert!(changes[0].is_break);
//!
//! let report = render_changes(&changes, "monitor", OutputFormat::Text, false).unwrap();
//! let Rendered::Text(lines) = report else { unreachable!() };
//! assert!(lines[0].starts_with("cmd `monitor clone` removed"));
//! ```

use std::collections::HashSet;
use std::path::Path;

use cli_meta_core::{Change, CommandMetaRoot, Result};

mod deep;
mod detect;
mod path;
mod render;

pub use deep::{DeepDiff, ValueChange};
pub use detect::{read_whitelist, MetaChangeDetector};
pub use path::{
    extract_cmd_name, extract_property, extract_subgroup_name, PathKind, PathLocator,
};
pub use render::{render_changes, write_output, OutputFormat, Rendered};

/// Diffs two in-memory snapshots without a suppression whitelist.
pub fn diff_trees(base: &CommandMetaRoot, diff: &CommandMetaRoot) -> Result<Vec<Change>> {
    MetaChangeDetector::new(base, diff)?.detect()
}

/// Diffs two snapshot files.
///
/// Both files must parse as meta trees and describe the same module.
/// When a whitelist file is given, breaking changes whose filter key
/// appears in it are suppressed.
pub fn diff_meta_files(
    base_path: &Path,
    diff_path: &Path,
    whitelist_path: Option<&Path>,
) -> Result<Vec<Change>> {
    let base = CommandMetaRoot::load(base_path)?;
    let diff = CommandMetaRoot::load(diff_path)?;
    let whitelist = match whitelist_path {
        Some(path) => read_whitelist(path)?,
        None => HashSet::new(),
    };
    MetaChangeDetector::new(&base, &diff)?
        .with_whitelist(whitelist)
        .detect()
}
