//! Parsing of deep-diff path strings into typed locators.
//!
//! Deep-diff edits are keyed by bracketed path strings such as
//!
//! ```text
//! root['sub_groups']['monitor']['sub_groups']['monitor account']
//!     ['commands']['monitor account create']['parameters'][3]['options'][1]
//! ```
//!
//! This module extracts the command or group the edit touches, the
//! property below it, and any parameter indices. Paths that do not
//! match the snapshot shape yield `None`; callers log and skip them.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static SUBGROUP_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\['sub_groups'\]\['([a-zA-Z0-9\-\s]+)'\]").expect("static regex must compile")
});

static CMD_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\['commands'\]\['([a-zA-Z0-9\-\s]+)'\]").expect("static regex must compile")
});

static BRACKET_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]").expect("static regex must compile"));

/// Extracts the command name from a path, if any.
///
/// The first `['commands'][X]` match wins; nested occurrences inside a
/// command name cannot happen because command names never contain
/// brackets.
pub fn extract_cmd_name(key: &str) -> Option<String> {
    CMD_NAME_RE
        .captures(key)
        .map(|caps| caps[1].to_string())
}

/// Extracts the deepest group name from a path, if any.
///
/// The last `['sub_groups'][X]` match wins, so a change inside
/// `monitor log-profiles` is attributed to that group rather than to
/// `monitor`.
pub fn extract_subgroup_name(key: &str) -> Option<String> {
    SUBGROUP_NAME_RE
        .captures_iter(key)
        .last()
        .map(|caps| caps[1].to_string())
}

/// Extracts the property key immediately following `name` in the path.
pub fn extract_property(key: &str, name: &str) -> Option<String> {
    let pattern = format!(r"{}'\]\['([a-zA-Z0-9\-_]+)'\]", regex::escape(name));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => {
            warn!(name, %err, "property pattern failed to compile");
            return None;
        }
    };
    re.captures(key).map(|caps| caps[1].to_string())
}

/// Where in the tree a deep-diff edit landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// A whole group was added or removed.
    Group,
    /// A property directly on a group.
    GroupProperty,
    /// A whole command was added or removed.
    Command,
    /// A property directly on a command (other than `parameters`).
    CommandProperty,
    /// The `parameters` list itself, or one element of it.
    Parameter,
    /// A property of one parameter.
    ParameterProperty,
    /// One element of a parameter's list-valued property.
    ParameterListElement,
}

/// Typed locator parsed from a deep-diff path string.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLocator {
    pub kind: PathKind,
    pub subgroup_name: Option<String>,
    pub command_name: Option<String>,
    pub command_property: Option<String>,
    pub parameter_index: Option<usize>,
    pub parameter_property: Option<String>,
    pub element_index: Option<usize>,
}

impl PathLocator {
    /// Parses a path string; `None` means the path does not address a
    /// recognizable tree location.
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(cmd_name) = extract_cmd_name(key) {
            return Some(Self::parse_below_command(key, cmd_name));
        }
        let subgroup_name = extract_subgroup_name(key)?;
        match extract_property(key, &subgroup_name) {
            Some(prop) => Some(PathLocator {
                kind: PathKind::GroupProperty,
                subgroup_name: Some(subgroup_name),
                command_name: None,
                command_property: Some(prop),
                parameter_index: None,
                parameter_property: None,
                element_index: None,
            }),
            None => Some(PathLocator {
                kind: PathKind::Group,
                subgroup_name: Some(subgroup_name),
                command_name: None,
                command_property: None,
                parameter_index: None,
                parameter_property: None,
                element_index: None,
            }),
        }
    }

    fn parse_below_command(key: &str, cmd_name: String) -> Self {
        let subgroup_name = extract_subgroup_name(key);
        let mut locator = PathLocator {
            kind: PathKind::Command,
            subgroup_name,
            command_name: Some(cmd_name.clone()),
            command_property: None,
            parameter_index: None,
            parameter_property: None,
            element_index: None,
        };
        let Some(prop) = extract_property(key, &cmd_name) else {
            return locator;
        };
        locator.command_property = Some(prop.clone());
        if prop != "parameters" {
            locator.kind = PathKind::CommandProperty;
            return locator;
        }
        locator.kind = PathKind::Parameter;

        // tokens after ['parameters']: index, property key, element index
        let tail_start = match key.find("['parameters']") {
            Some(pos) => pos + "['parameters']".len(),
            None => return locator,
        };
        let mut tokens = BRACKET_TOKEN_RE
            .captures_iter(&key[tail_start..])
            .map(|caps| caps[1].to_string());
        if let Some(index) = tokens.next().and_then(|t| t.parse::<usize>().ok()) {
            locator.parameter_index = Some(index);
        } else {
            return locator;
        }
        if let Some(token) = tokens.next() {
            locator.parameter_property = Some(token.trim_matches('\'').to_string());
            locator.kind = PathKind::ParameterProperty;
        }
        if let Some(index) = tokens.next().and_then(|t| t.parse::<usize>().ok()) {
            locator.element_index = Some(index);
            locator.kind = PathKind::ParameterListElement;
        }
        locator
    }
}
