//! Module version parsing and formatting.
//!
//! Module versions follow a small PEP-440-like grammar rather than
//! semver: `major.minor[.patch]` with an optional `a`/`b` pre-release
//! suffix directly attached, e.g. `3.11.0`, `1.0.0b3`, `0.5.1a2`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, VersionError};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?(?:(a|b)(\d+))?$").expect("static regex must compile")
});

/// Pre-release tag letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreTag {
    Alpha,
    Beta,
}

impl PreTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreTag::Alpha => "a",
            PreTag::Beta => "b",
        }
    }
}

/// A parsed module version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release suffix, absent on stable versions.
    pub pre: Option<(PreTag, u64)>,
}

impl ModuleVersion {
    /// True when the version carries a pre-release suffix.
    pub fn is_pre(&self) -> bool {
        self.pre.is_some()
    }

    /// Pre-release number, or `None` on stable versions.
    pub fn pre_num(&self) -> Option<u64> {
        self.pre.map(|(_, num)| num)
    }

    /// The first stable release: `1.0.0`.
    pub fn first_stable() -> Self {
        Self {
            major: 1,
            minor: 0,
            patch: 0,
            pre: None,
        }
    }

    /// The first preview release: `1.0.0b1`.
    pub fn first_preview() -> Self {
        Self {
            major: 1,
            minor: 0,
            patch: 0,
            pre: Some((PreTag::Beta, 1)),
        }
    }
}

impl FromStr for ModuleVersion {
    type Err = VersionError;

    fn from_str(raw: &str) -> Result<Self> {
        let caps = VERSION_RE
            .captures(raw.trim())
            .ok_or_else(|| VersionError::InvalidVersion(raw.to_string()))?;
        let parse_num = |index: usize| -> Result<u64> {
            caps.get(index)
                .map_or(Ok(0), |m| {
                    m.as_str()
                        .parse()
                        .map_err(|_| VersionError::InvalidVersion(raw.to_string()))
                })
        };
        let pre = match caps.get(4) {
            Some(tag) => {
                let tag = match tag.as_str() {
                    "a" => PreTag::Alpha,
                    _ => PreTag::Beta,
                };
                Some((tag, parse_num(5)?))
            }
            None => None,
        };
        Ok(ModuleVersion {
            major: parse_num(1)?,
            minor: parse_num(2)?,
            patch: parse_num(3)?,
            pre,
        })
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some((tag, num)) = self.pre {
            write!(f, "{}{}", tag.as_str(), num)?;
        }
        Ok(())
    }
}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let release = (self.major, self.minor, self.patch).cmp(&(
            other.major,
            other.minor,
            other.patch,
        ));
        if release != std::cmp::Ordering::Equal {
            return release;
        }
        // a pre-release sorts below the stable release it precedes
        match (self.pre, other.pre) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some((tag_a, num_a)), Some((tag_b, num_b))) => {
                (tag_a.as_str(), num_a).cmp(&(tag_b.as_str(), num_b))
            }
        }
    }
}
