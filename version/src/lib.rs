//! Next-version computation for CLI modules.
//!
//! Combines three inputs to decide what a module's next released
//! version must be: the detected change list between two metadata
//! snapshots, the current version with its stability flags, and the
//! released-version history from the public package index.
//!
//! - [`ModuleVersion`] — PEP-440-like `major.minor.patch[a|b N]`
//!   version parsing and formatting.
//! - [`VersionUpgrade`] — the bump rules over a change list.
//! - [`PackageIndexClient`] — fetches the highest released stable
//!   major.
//!
//! # Example
//!
//! ```
//! use cli_meta_version::VersionUpgrade;
//!
//! let result = VersionUpgrade::new("monitor", "3.11.0", false, false, &[])
//!     .unwrap()
//!     .compute()
//!     .unwrap();
//! assert_eq!(result.version, "3.11.1");
//! assert!(result.is_stable);
//! ```

use std::path::Path;

use tracing::warn;

mod engine;
mod error;
mod index;
mod modver;

pub use engine::{PreTagChoice, SegmentTagChoice, VersionUpgrade, VersionUpgradeResult};
pub use error::{Result, VersionError};
pub use index::{find_max_stable_major, PackageIndexClient, DEFAULT_INDEX_URL};
pub use modver::{ModuleVersion, PreTag};

/// Inputs of a file-based next-version computation.
#[derive(Debug, Clone, Default)]
pub struct NextVersionRequest {
    pub module_name: String,
    pub current_version: String,
    pub is_preview: bool,
    pub is_experimental: bool,
    pub next_version_pre_tag: Option<PreTagChoice>,
    pub next_version_segment_tag: Option<SegmentTagChoice>,
    /// Package-index location; defaults to [`DEFAULT_INDEX_URL`].
    pub index_url: Option<String>,
}

/// Computes the next version for a module from two snapshot files.
///
/// The package index is consulted once; when it is unavailable the
/// module is treated as unknown to the index, which is the conservative
/// reading for the preview-rollover rule.
pub fn next_version(
    base_meta_path: &Path,
    diff_meta_path: &Path,
    request: &NextVersionRequest,
) -> Result<VersionUpgradeResult> {
    let changes = cli_meta_diff::diff_meta_files(base_meta_path, diff_meta_path, None)?;

    let client = match &request.index_url {
        Some(url) => PackageIndexClient::new(url),
        None => PackageIndexClient::default(),
    };
    let last_stable_major = match client.last_stable_major(&request.module_name) {
        Ok(value) => value,
        Err(err) => {
            warn!(module = %request.module_name, %err, "package index unavailable, treating module as unknown");
            None
        }
    };

    VersionUpgrade::new(
        &request.module_name,
        &request.current_version,
        request.is_preview,
        request.is_experimental,
        &changes,
    )?
    .with_pre_tag(request.next_version_pre_tag)
    .with_segment_tag(request.next_version_segment_tag)
    .with_last_stable_major(last_stable_major)
    .compute()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli_meta_core::{Command, CommandMetaRoot};

    #[test]
    fn test_next_version_from_files_with_unreachable_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = CommandMetaRoot::new("monitor");
        base.insert_command(Command::new("monitor clone"));
        let diff = CommandMetaRoot::new("monitor");

        let base_path = dir.path().join("before.json");
        let diff_path = dir.path().join("after.json");
        std::fs::write(&base_path, base.to_canonical_json().unwrap()).unwrap();
        std::fs::write(&diff_path, diff.to_canonical_json().unwrap()).unwrap();

        let request = NextVersionRequest {
            module_name: "monitor".to_string(),
            current_version: "3.11.0".to_string(),
            // unroutable port keeps the test offline
            index_url: Some("http://127.0.0.1:9/index.json".to_string()),
            ..Default::default()
        };
        let result = next_version(&base_path, &diff_path, &request).unwrap();
        // command removal is breaking
        assert_eq!(result.version, "4.0.0");
        assert!(result.is_stable);
    }
}
