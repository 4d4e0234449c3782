//! Next-version computation.
//!
//! Applies the module versioning rules over a detected change list:
//! breaking changes bump the major, non-breaking changes the minor,
//! an empty diff the patch; preview lines instead advance their
//! pre-release number, and a preview major that has moved past the last
//! released stable major keeps accumulating breaking changes without a
//! further major bump until a stable release is cut.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use cli_meta_core::Change;

use crate::error::{Result, VersionError};
use crate::modver::{ModuleVersion, PreTag};

/// Caller override for the stability of the next version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreTagChoice {
    Stable,
    Preview,
}

impl FromStr for PreTagChoice {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "stable" => Ok(PreTagChoice::Stable),
            "preview" => Ok(PreTagChoice::Preview),
            other => Err(VersionError::UnknownPreTag(other.to_string())),
        }
    }
}

impl fmt::Display for PreTagChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreTagChoice::Stable => write!(f, "stable"),
            PreTagChoice::Preview => write!(f, "preview"),
        }
    }
}

/// Caller override forcing which version segment is bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTagChoice {
    Major,
    Minor,
    Patch,
    Pre,
}

impl FromStr for SegmentTagChoice {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "major" => Ok(SegmentTagChoice::Major),
            "minor" => Ok(SegmentTagChoice::Minor),
            "patch" => Ok(SegmentTagChoice::Patch),
            "pre" => Ok(SegmentTagChoice::Pre),
            other => Err(VersionError::UnknownSegmentTag(other.to_string())),
        }
    }
}

/// Result of a next-version computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionUpgradeResult {
    pub version: String,
    pub is_stable: bool,
    pub has_preview_tag: bool,
    pub has_exp_tag: bool,
}

/// Next-version computation for one module.
pub struct VersionUpgrade<'a> {
    module_name: String,
    current: ModuleVersion,
    /// Whether the current line is effectively preview: asserted flags
    /// or a pre-release suffix on the current version.
    is_preview: bool,
    has_preview_flag: bool,
    has_exp_flag: bool,
    changes: &'a [Change],
    pre_tag: PreTagChoice,
    segment_tag: Option<SegmentTagChoice>,
    /// Highest stable major released per the package index; `None`
    /// when the module is unknown to the index.
    last_stable_major: Option<u64>,
}

impl<'a> VersionUpgrade<'a> {
    /// Builds an upgrade computation from the current state of a
    /// module.
    ///
    /// If preview or experimental is asserted but the version has no
    /// pre-release suffix, the version is normalized by appending `b1`.
    pub fn new(
        module_name: &str,
        current_version: &str,
        is_preview: bool,
        is_experimental: bool,
        changes: &'a [Change],
    ) -> Result<Self> {
        let mut current: ModuleVersion = current_version.parse()?;
        let effective_preview = is_preview || is_experimental || current.is_pre();
        if effective_preview && !current.is_pre() {
            current.pre = Some((PreTag::Beta, 1));
        }
        let pre_tag = if effective_preview {
            PreTagChoice::Preview
        } else {
            PreTagChoice::Stable
        };
        Ok(Self {
            module_name: module_name.to_string(),
            current,
            is_preview: effective_preview,
            has_preview_flag: is_preview,
            has_exp_flag: is_experimental,
            changes,
            pre_tag,
            segment_tag: None,
            last_stable_major: None,
        })
    }

    /// Overrides the inherited stable/preview target.
    pub fn with_pre_tag(mut self, pre_tag: Option<PreTagChoice>) -> Self {
        if let Some(pre_tag) = pre_tag {
            self.pre_tag = pre_tag;
        }
        self
    }

    /// Forces a specific segment bump instead of deriving one from the
    /// diff.
    pub fn with_segment_tag(mut self, segment_tag: Option<SegmentTagChoice>) -> Self {
        self.segment_tag = segment_tag;
        self
    }

    /// Installs the index-derived last stable major; `None` means the
    /// module is unknown to the index.
    pub fn with_last_stable_major(mut self, last_stable_major: Option<u64>) -> Self {
        self.last_stable_major = last_stable_major;
        self
    }

    /// Computes the next version.
    pub fn compute(&self) -> Result<VersionUpgradeResult> {
        let mut next = self.current.clone();
        match self.pre_tag {
            PreTagChoice::Stable => next.pre = None,
            PreTagChoice::Preview => {
                next.pre = Some((PreTag::Beta, self.current.pre_num().unwrap_or(1)));
            }
        }

        if self.current.major < 1 {
            // a zero-major line jumps straight to the first release
            next = match self.pre_tag {
                PreTagChoice::Stable => ModuleVersion::first_stable(),
                PreTagChoice::Preview => ModuleVersion::first_preview(),
            };
            return Ok(self.format_result(next));
        }

        if let Some(segment_tag) = self.segment_tag {
            self.apply_segment_tag(&mut next, segment_tag);
            return Ok(self.format_result(next));
        }

        self.derive_from_changes(&mut next);
        Ok(self.format_result(next))
    }

    fn apply_segment_tag(&self, next: &mut ModuleVersion, segment_tag: SegmentTagChoice) {
        match segment_tag {
            SegmentTagChoice::Major => self.bump_major(next),
            SegmentTagChoice::Minor => {
                next.minor = self.current.minor + 1;
                next.patch = 0;
            }
            SegmentTagChoice::Patch => {
                next.patch = self.current.patch + 1;
            }
            SegmentTagChoice::Pre => {
                next.pre = Some((PreTag::Beta, self.current.pre_num().unwrap_or(0) + 1));
            }
        }
    }

    fn derive_from_changes(&self, next: &mut ModuleVersion) {
        let found_break = self.changes.iter().any(|change| change.is_break);
        if found_break {
            let preview_rollover = self.pre_tag == PreTagChoice::Preview
                && self.is_preview
                && self
                    .last_stable_major
                    .is_none_or(|stable| stable < self.current.major);
            if preview_rollover {
                // the preview major keeps absorbing breaking changes
                // until a stable release is cut for it
                debug!(module = %self.module_name, "preview rollover, advancing pre number only");
                self.bump_pre_num(next);
            } else {
                self.bump_major(next);
            }
        } else if !self.changes.is_empty() {
            if self.is_preview {
                self.bump_pre_num(next);
            } else {
                next.minor = self.current.minor + 1;
                next.patch = 0;
            }
        } else if self.is_preview {
            self.bump_pre_num(next);
        } else {
            next.patch = self.current.patch + 1;
        }
    }

    /// Bumps the major and resets everything below it; a preview line
    /// restarts its pre-release numbering at 1.
    fn bump_major(&self, next: &mut ModuleVersion) {
        next.major = self.current.major + 1;
        next.minor = 0;
        next.patch = 0;
        if next.pre.is_some() {
            next.pre = Some((PreTag::Beta, 1));
        }
    }

    fn bump_pre_num(&self, next: &mut ModuleVersion) {
        if let Some((tag, _)) = next.pre {
            next.pre = Some((tag, self.current.pre_num().unwrap_or(0) + 1));
        }
    }

    fn format_result(&self, next: ModuleVersion) -> VersionUpgradeResult {
        let is_stable = !next.is_pre();
        VersionUpgradeResult {
            version: next.to_string(),
            is_stable,
            has_preview_tag: !is_stable && self.has_preview_flag,
            has_exp_tag: !is_stable && self.has_exp_flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaking_change() -> Change {
        Change::cmd_remove("monitor clone").unwrap()
    }

    fn non_breaking_change() -> Change {
        Change::cmd_add("monitor copy", false).unwrap()
    }

    fn upgrade<'a>(current: &str, changes: &'a [Change]) -> VersionUpgrade<'a> {
        VersionUpgrade::new("monitor", current, false, false, changes).unwrap()
    }

    #[test]
    fn test_breaking_change_bumps_major() {
        let changes = vec![breaking_change()];
        let result = upgrade("3.11.0", &changes)
            .with_last_stable_major(Some(3))
            .compute()
            .unwrap();
        assert_eq!(result.version, "4.0.0");
        assert!(result.is_stable);
    }

    #[test]
    fn test_non_breaking_change_bumps_minor() {
        let changes = vec![non_breaking_change()];
        let result = upgrade("3.11.0", &changes).compute().unwrap();
        assert_eq!(result.version, "3.12.0");
    }

    #[test]
    fn test_empty_diff_bumps_patch() {
        let result = upgrade("3.11.0", &[]).compute().unwrap();
        assert_eq!(result.version, "3.11.1");
    }

    #[test]
    fn test_zero_major_jumps_to_first_release() {
        let changes = vec![breaking_change()];
        let stable = upgrade("0.5.1", &changes).compute().unwrap();
        assert_eq!(stable.version, "1.0.0");
        let preview = VersionUpgrade::new("monitor", "0.5.1", true, false, &changes)
            .unwrap()
            .compute()
            .unwrap();
        assert_eq!(preview.version, "1.0.0b1");
    }

    #[test]
    fn test_preview_rollover_with_no_prior_stable() {
        let changes = vec![breaking_change()];
        for last_stable in [None, Some(0)] {
            let result = VersionUpgrade::new("monitor", "1.0.0b3", true, false, &changes)
                .unwrap()
                .with_last_stable_major(last_stable)
                .compute()
                .unwrap();
            assert_eq!(result.version, "1.0.0b4");
            assert!(result.has_preview_tag);
            assert!(!result.is_stable);
        }
    }

    #[test]
    fn test_preview_breaking_after_stable_caught_up_bumps_major() {
        let changes = vec![breaking_change()];
        let result = VersionUpgrade::new("monitor", "2.0.0b2", true, false, &changes)
            .unwrap()
            .with_last_stable_major(Some(2))
            .compute()
            .unwrap();
        assert_eq!(result.version, "3.0.0b1");
    }

    #[test]
    fn test_major_bump_restarts_preview_numbering() {
        let changes = vec![breaking_change()];
        let derived = VersionUpgrade::new("monitor", "2.0.0b7", true, false, &changes)
            .unwrap()
            .with_last_stable_major(Some(2))
            .compute()
            .unwrap();
        assert_eq!(derived.version, "3.0.0b1");

        let forced = VersionUpgrade::new("monitor", "2.0.0b7", true, false, &[])
            .unwrap()
            .with_segment_tag(Some(SegmentTagChoice::Major))
            .compute()
            .unwrap();
        assert_eq!(forced.version, "3.0.0b1");
    }

    #[test]
    fn test_preview_non_breaking_bumps_pre_num() {
        let changes = vec![non_breaking_change()];
        let result = VersionUpgrade::new("monitor", "1.2.0b5", true, false, &changes)
            .unwrap()
            .compute()
            .unwrap();
        assert_eq!(result.version, "1.2.0b6");
    }

    #[test]
    fn test_preview_flag_without_suffix_is_normalized() {
        let result = VersionUpgrade::new("monitor", "1.2.0", true, false, &[])
            .unwrap()
            .compute()
            .unwrap();
        assert_eq!(result.version, "1.2.0b2");
    }

    #[test]
    fn test_stable_target_graduates_preview_line() {
        let changes = vec![non_breaking_change()];
        let result = VersionUpgrade::new("monitor", "1.2.3b4", true, false, &changes)
            .unwrap()
            .with_pre_tag(Some(PreTagChoice::Stable))
            .compute()
            .unwrap();
        assert_eq!(result.version, "1.2.3");
        assert!(result.is_stable);
        assert!(!result.has_preview_tag);
    }

    #[test]
    fn test_segment_tag_overrides_diff() {
        let changes = vec![breaking_change()];
        let result = upgrade("3.11.2", &changes)
            .with_segment_tag(Some(SegmentTagChoice::Patch))
            .compute()
            .unwrap();
        assert_eq!(result.version, "3.11.3");

        let minor = upgrade("3.11.2", &[])
            .with_segment_tag(Some(SegmentTagChoice::Minor))
            .compute()
            .unwrap();
        assert_eq!(minor.version, "3.12.0");

        let pre = VersionUpgrade::new("monitor", "3.11.2b2", true, false, &[])
            .unwrap()
            .with_segment_tag(Some(SegmentTagChoice::Pre))
            .compute()
            .unwrap();
        assert_eq!(pre.version, "3.11.2b3");
    }

    #[test]
    fn test_experimental_flag_sets_exp_output() {
        let result = VersionUpgrade::new("monitor", "1.0.0b1", false, true, &[])
            .unwrap()
            .compute()
            .unwrap();
        assert_eq!(result.version, "1.0.0b2");
        assert!(result.has_exp_tag);
        assert!(!result.has_preview_tag);
    }

    #[test]
    fn test_stable_next_version_is_monotonic() {
        let changes = vec![non_breaking_change()];
        for current in ["1.0.0", "2.5.3", "10.0.1"] {
            let result = upgrade(current, &changes).compute().unwrap();
            let parsed: ModuleVersion = result.version.parse().unwrap();
            let before: ModuleVersion = current.parse().unwrap();
            assert!(parsed > before, "{current} -> {}", result.version);
        }
    }
}
