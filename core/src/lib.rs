//! Core meta-tree model and change rules for CLI command metadata.
//!
//! This crate defines the foundational types for modeling a CLI module's
//! command surface and the changes between two snapshots of it:
//!
//! - [`CommandMetaRoot`] — root of a module snapshot, holding command
//!   groups and root-level commands.
//! - [`CommandGroup`] / [`Command`] / [`Parameter`] — the tree nodes,
//!   with deterministic sorted-key JSON serialization.
//! - [`ChangeRule`] / [`RULES`] — the fixed rule table mapping every
//!   detectable change to a four-digit id with message templates.
//! - [`Change`] — a detected change record with location, rendered
//!   values, and a filled message and suggestion.
//!
//! Validation ([`validate_root`], [`validate_command`]) catches
//! structural errors such as duplicate parameters and unsorted option
//! lists.
//!
//! # Example
//!
//! ```
//! use cli_meta_core::*;
//!
//! let mut root = CommandMetaRoot::new("monitor");
//! root.insert_command(
//!     Command::new("monitor log-profiles create")
//!         .with_parameter(Parameter::new("name").with_options(&["--name", "-n"]).required()),
//! );
//!
//! assert!(root.find_command("monitor log-profiles create").is_some());
//! assert!(validate_root(&root).is_empty());
//!
//! let snapshot = root.to_canonical_json().unwrap();
//! assert_eq!(CommandMetaRoot::parse(&snapshot).unwrap(), root);
//! ```

mod change;
mod error;
mod rules;
mod tree;
mod validate;

pub use change::{Change, ChangeKind};
pub use error::{MetaError, Result};
pub use rules::{
    fill_template, format_value, is_whitelisted_update, rule_by_id, ChangeRule,
    CHECKED_PARA_PROPERTIES, CMD_PROPERTY_ADD_BREAK_LIST, CMD_PROPERTY_REMOVE_BREAK_LIST,
    CMD_PROPERTY_UPDATE_BREAK_LIST, PARA_PROPERTY_ADD_BREAK_LIST, PARA_PROPERTY_REMOVE_BREAK_LIST,
    PARA_PROPERTY_UPDATE_BREAK_LIST, PROPERTY_IGNORED_LIST, RULES,
    SUBGROUP_PROPERTY_ADD_BREAK_LIST, SUBGROUP_PROPERTY_REMOVE_BREAK_LIST,
    SUBGROUP_PROPERTY_UPDATE_BREAK_LIST, UPDATE_WHITELISTED_TRANSITIONS,
};
pub use tree::{
    canonical_json, Command, CommandGroup, CommandMetaRoot, DeprecateInfo, DeprecatedOption,
    OptionItem, Parameter, ROOT_NAME,
};
pub use validate::{validate_command, validate_root, ValidationError};
