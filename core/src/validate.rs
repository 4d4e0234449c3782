//! Meta-tree validation.
//!
//! Validates structural invariants of a loaded snapshot, catching
//! problems such as duplicate parameters, unsorted option lists, and
//! contradictory stability flags before they reach the differ.
//!
//! # Examples
//!
//! ```
//! use cli_meta_core::*;
//!
//! let mut root = CommandMetaRoot::new("monitor");
//! root.insert_command(
//!     Command::new("monitor clone")
//!         .with_parameter(Parameter::new("name").with_options(&["--name", "-n"])),
//! );
//! assert!(validate_root(&root).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{Command, CommandGroup, CommandMetaRoot};

/// Meta-tree validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Module name on the root is empty.
    #[error("module name cannot be empty")]
    EmptyModuleName,
    /// Command name is empty or whitespace-only.
    #[error("command name cannot be empty")]
    EmptyCommandName,
    /// A command's map key does not match its `name` field.
    #[error("command key mismatch: key `{key}` holds command `{name}`")]
    CommandKeyMismatch { key: String, name: String },
    /// A group's map key does not match its `name` field.
    #[error("group key mismatch: key `{key}` holds group `{name}`")]
    GroupKeyMismatch { key: String, name: String },
    /// Two parameters of one command share a destination name.
    #[error("duplicate parameter `{1}` in command `{0}`")]
    DuplicateParameter(String, String),
    /// A parameter's option list is not sorted or holds duplicates.
    #[error("options of parameter `{1}` in command `{0}` are not sorted and unique")]
    UnsortedOptions(String, String),
    /// A parameter's choice list is not sorted or holds duplicates.
    #[error("choices of parameter `{1}` in command `{0}` are not sorted and unique")]
    UnsortedChoices(String, String),
    /// A command is marked both preview and experimental.
    #[error("command `{0}` is both preview and experimental")]
    ConflictingStability(String),
}

/// Validates a whole snapshot tree.
///
/// Collects every violation instead of stopping at the first, so one
/// pass reports everything a snapshot producer needs to fix.
pub fn validate_root(root: &CommandMetaRoot) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if root.module_name.trim().is_empty() {
        errors.push(ValidationError::EmptyModuleName);
    }

    for (key, command) in &root.commands {
        validate_command_entry(key, command, &mut errors);
    }
    for (key, group) in &root.sub_groups {
        validate_group(key, group, &mut errors);
    }

    errors
}

fn validate_group(key: &str, group: &CommandGroup, errors: &mut Vec<ValidationError>) {
    if group.name != key {
        errors.push(ValidationError::GroupKeyMismatch {
            key: key.to_string(),
            name: group.name.clone(),
        });
    }
    for (cmd_key, command) in &group.commands {
        validate_command_entry(cmd_key, command, errors);
    }
    for (sub_key, sub) in &group.sub_groups {
        validate_group(sub_key, sub, errors);
    }
}

fn validate_command_entry(key: &str, command: &Command, errors: &mut Vec<ValidationError>) {
    if command.name.trim().is_empty() {
        errors.push(ValidationError::EmptyCommandName);
        return;
    }
    if command.name != key {
        errors.push(ValidationError::CommandKeyMismatch {
            key: key.to_string(),
            name: command.name.clone(),
        });
    }
    errors.extend(validate_command(command));
}

/// Validates a single command.
pub fn validate_command(command: &Command) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if command.is_preview == Some(true) && command.is_experimental == Some(true) {
        errors.push(ValidationError::ConflictingStability(command.name.clone()));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for para in &command.parameters {
        if !seen.insert(para.name.as_str()) {
            errors.push(ValidationError::DuplicateParameter(
                command.name.clone(),
                para.name.clone(),
            ));
        }
        if !is_sorted_unique(&para.option_names()) {
            errors.push(ValidationError::UnsortedOptions(
                command.name.clone(),
                para.name.clone(),
            ));
        }
        if let Some(choices) = &para.choices {
            let refs: Vec<&str> = choices.iter().map(String::as_str).collect();
            if !is_sorted_unique(&refs) {
                errors.push(ValidationError::UnsortedChoices(
                    command.name.clone(),
                    para.name.clone(),
                ));
            }
        }
    }

    errors
}

fn is_sorted_unique(items: &[&str]) -> bool {
    items.windows(2).all(|pair| pair[0] < pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parameter;

    #[test]
    fn test_accepts_valid_tree() {
        let mut root = CommandMetaRoot::new("monitor");
        root.insert_command(
            Command::new("monitor log-profiles create")
                .with_parameter(Parameter::new("name").with_options(&["--name", "-n"])),
        );
        assert!(validate_root(&root).is_empty());
    }

    #[test]
    fn test_rejects_duplicate_parameters() {
        let mut root = CommandMetaRoot::new("monitor");
        root.insert_command(
            Command::new("monitor clone")
                .with_parameter(Parameter::new("name"))
                .with_parameter(Parameter::new("name")),
        );
        let errors = validate_root(&root);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateParameter(
                "monitor clone".to_string(),
                "name".to_string()
            )]
        );
    }

    #[test]
    fn test_rejects_unsorted_options() {
        let mut command = Command::new("monitor clone");
        let mut para = Parameter::new("name");
        para.options = vec![
            crate::OptionItem::Name("-n".to_string()),
            crate::OptionItem::Name("--name".to_string()),
        ];
        command.parameters.push(para);
        let errors = validate_command(&command);
        assert_eq!(
            errors,
            vec![ValidationError::UnsortedOptions(
                "monitor clone".to_string(),
                "name".to_string()
            )]
        );
    }

    #[test]
    fn test_rejects_conflicting_stability() {
        let mut command = Command::new("monitor clone");
        command.is_preview = Some(true);
        command.is_experimental = Some(true);
        let errors = validate_command(&command);
        assert_eq!(
            errors,
            vec![ValidationError::ConflictingStability(
                "monitor clone".to_string()
            )]
        );
    }

    #[test]
    fn test_rejects_key_mismatch() {
        let mut root = CommandMetaRoot::new("monitor");
        root.commands
            .insert("monitor wrong".to_string(), Command::new("monitor clone"));
        let errors = validate_root(&root);
        assert_eq!(
            errors,
            vec![ValidationError::CommandKeyMismatch {
                key: "monitor wrong".to_string(),
                name: "monitor clone".to_string()
            }]
        );
    }
}
