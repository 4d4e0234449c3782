//! Meta-tree type definitions for command surface modeling.
//!
//! This module defines the canonical in-memory representation of a CLI
//! module's public command surface: a root holding command groups, which
//! hold commands, which hold parameters. The types round-trip through
//! JSON with [`serde`] and serialize deterministically — group and
//! command maps are [`BTreeMap`]s, so equivalent trees always produce
//! identical snapshot bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MetaError, Result};

/// Name of the host CLI; every snapshot root carries it.
pub const ROOT_NAME: &str = "az";

/// Deprecation metadata attached to groups, commands, parameters, or
/// individual options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeprecateInfo {
    /// The deprecated name itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Replacement the caller should migrate to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Whether the deprecated name is hidden from help output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    /// CLI version at which the deprecated name stops working.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

/// A deprecated option entry kept inside a parameter's `options` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedOption {
    /// Visible option string (e.g. `--old-name`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

/// One entry of a parameter's `options` list.
///
/// Plain aliases are bare strings; deprecated aliases are preserved as
/// nested objects so callers can see redirect and expiration details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionItem {
    /// Plain option string (e.g. `--name`, `-n`).
    Name(String),
    /// Deprecated option with migration metadata.
    Deprecated(DeprecatedOption),
}

impl OptionItem {
    /// Returns the visible option string for either entry form.
    pub fn name(&self) -> &str {
        match self {
            OptionItem::Name(name) => name,
            OptionItem::Deprecated(dep) => &dep.name,
        }
    }
}

/// Schema for a single command parameter.
///
/// `name` is the destination identifier, not an option string; option
/// strings live in `options`, sorted lexicographically. Commands backed
/// by the declarative back-end additionally carry `aaz_*` attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parameter {
    /// Destination identifier (e.g. `resource_group_name`).
    pub name: String,
    /// Sorted option strings, deprecated entries as nested objects.
    #[serde(default)]
    pub options: Vec<OptionItem>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Sorted allowed values, when the parameter is an enumeration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Declarative-backend argument type (e.g. `string`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaz_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaz_default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaz_choices: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecate_info: Option<DeprecateInfo>,
}

impl Parameter {
    /// Creates a parameter with the given destination name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets sorted plain option strings.
    pub fn with_options(mut self, options: &[&str]) -> Self {
        let mut sorted: Vec<String> = options.iter().map(|s| s.to_string()).collect();
        sorted.sort();
        self.options = sorted.into_iter().map(OptionItem::Name).collect();
        self
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Returns the visible option strings in list order.
    pub fn option_names(&self) -> Vec<&str> {
        self.options.iter().map(OptionItem::name).collect()
    }
}

/// Schema for a single command.
///
/// `name` is the full space-separated path from the CLI root (e.g.
/// `monitor log-profiles create`). Stability flags are stored only when
/// set, matching the snapshot contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    /// Full command path from the root.
    pub name: String,
    /// Whether the command is generated from the declarative back-end.
    #[serde(default)]
    pub is_aaz: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_no_wait: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_preview: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_experimental: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecate_info: Option<DeprecateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Command {
    /// Creates a command with the given full path.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Finds a parameter by destination name.
    pub fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A command group node.
///
/// Group map keys are the full dotted prefix path (`monitor
/// log-profiles`), never the leaf token, so descent from the root walks
/// progressively longer prefixes of a command name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandGroup {
    /// Full prefix path from the root.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecate_info: Option<DeprecateInfo>,
    #[serde(default)]
    pub commands: BTreeMap<String, Command>,
    #[serde(default)]
    pub sub_groups: BTreeMap<String, CommandGroup>,
}

impl CommandGroup {
    /// Creates an empty group with the given full prefix path.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn insert_at_depth(&mut self, command: Command, tokens: &[&str], depth: usize) {
        if depth >= tokens.len() {
            self.commands.insert(command.name.clone(), command);
            return;
        }
        let key = tokens[..depth].join(" ");
        let child = self
            .sub_groups
            .entry(key.clone())
            .or_insert_with(|| CommandGroup::new(&key));
        child.insert_at_depth(command, tokens, depth + 1);
    }
}

/// Root of a module's meta tree.
///
/// # Examples
///
/// ```
/// use cli_meta_core::{Command, CommandMetaRoot, Parameter};
///
/// let mut root = CommandMetaRoot::new("monitor");
/// root.insert_command(
///     Command::new("monitor log-profiles create")
///         .with_parameter(Parameter::new("name").with_options(&["--name", "-n"]).required()),
/// );
///
/// let cmd = root.find_command("monitor log-profiles create").unwrap();
/// assert_eq!(cmd.parameters.len(), 1);
/// assert!(root.find_command("monitor log-profiles delete").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMetaRoot {
    /// Name of the CLI module this snapshot describes.
    pub module_name: String,
    /// Host CLI name, always [`ROOT_NAME`].
    pub name: String,
    #[serde(default)]
    pub commands: BTreeMap<String, Command>,
    #[serde(default)]
    pub sub_groups: BTreeMap<String, CommandGroup>,
}

impl CommandMetaRoot {
    /// Creates an empty root for the given module.
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            name: ROOT_NAME.to_string(),
            commands: BTreeMap::new(),
            sub_groups: BTreeMap::new(),
        }
    }

    /// Inserts a command, creating intermediate groups as needed.
    ///
    /// The command's full path is tokenized by spaces; every prefix of
    /// length one or more (except the full path itself) becomes a group
    /// keyed by the joined prefix.
    pub fn insert_command(&mut self, command: Command) {
        let name = command.name.clone();
        let tokens: Vec<&str> = name.split_whitespace().collect();
        if tokens.len() <= 1 {
            self.commands.insert(name, command);
            return;
        }
        let key = tokens[0].to_string();
        let group = self
            .sub_groups
            .entry(key.clone())
            .or_insert_with(|| CommandGroup::new(&key));
        group.insert_at_depth(command, &tokens, 2);
    }

    /// Looks up a command by full path, descending matching prefixes.
    pub fn find_command(&self, command_name: &str) -> Option<&Command> {
        let tokens: Vec<&str> = command_name.split_whitespace().collect();
        match tokens.len() {
            0 => None,
            1 => self.commands.get(command_name),
            _ => {
                let mut group = self.sub_groups.get(tokens[0])?;
                for depth in 2..tokens.len() {
                    group = group.sub_groups.get(&tokens[..depth].join(" "))?;
                }
                group.commands.get(command_name)
            }
        }
    }

    /// Looks up a group by full prefix path.
    pub fn find_group(&self, group_name: &str) -> Option<&CommandGroup> {
        let tokens: Vec<&str> = group_name.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }
        let mut group = self.sub_groups.get(tokens[0])?;
        for depth in 2..=tokens.len() {
            group = group.sub_groups.get(&tokens[..depth].join(" "))?;
        }
        Some(group)
    }

    /// Serializes to canonical snapshot text: sorted keys, 4-space
    /// indentation. Byte-stable for equivalent trees.
    pub fn to_canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(canonical_json(&value)?)
    }

    /// Serializes to a single-line JSON string.
    pub fn to_compact_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&serde_json::to_value(self)?)?)
    }

    /// Converts to a generic JSON value (sorted-key object tree).
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parses a snapshot from JSON text.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| MetaError::InvalidSnapshot {
            path: "<inline>".to_string(),
            reason: err.to_string(),
        })
    }

    /// Loads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| MetaError::InvalidSnapshot {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| MetaError::InvalidSnapshot {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    /// Returns an error if two snapshots describe different modules.
    pub fn check_same_module(&self, other: &CommandMetaRoot) -> Result<()> {
        if self.module_name != other.module_name {
            return Err(MetaError::SnapshotMismatch {
                base: self.module_name.clone(),
                diff: other.module_name.clone(),
            });
        }
        Ok(())
    }
}

/// Renders any JSON value with canonical snapshot formatting.
///
/// `serde_json::Value` objects are backed by a sorted map, so emitting a
/// value tree yields sorted keys; the formatter pins 4-space indents.
pub fn canonical_json(value: &Value) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8(buf).expect("serde_json emits UTF-8"))
}
