//! Input model for command-table documents.
//!
//! The host CLI's command loader hands the exporter a JSON document
//! describing every loaded command with its argument settings. These
//! types mirror that document; the exporter turns them into the
//! canonical meta tree.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Whole command-table document.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandTableDoc {
    /// Loaded commands, in table order.
    pub commands: Vec<CommandRecord>,
    /// Command-group help, keyed by full group path.
    #[serde(default)]
    pub command_groups: BTreeMap<String, GroupRecord>,
}

/// Group-level entries from the command table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupRecord {
    #[serde(default)]
    pub desc: Option<String>,
}

/// One loaded command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    /// Full space-separated command path.
    pub name: String,
    /// Module the command is loaded from.
    pub module: String,
    #[serde(default)]
    pub is_aaz: bool,
    #[serde(default)]
    pub confirmation: bool,
    #[serde(default)]
    pub supports_no_wait: bool,
    #[serde(default)]
    pub is_preview: bool,
    #[serde(default)]
    pub is_experimental: bool,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub examples: Option<Value>,
    #[serde(default)]
    pub arguments: Vec<ArgumentRecord>,
}

/// One argument's settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArgumentRecord {
    /// Destination identifier.
    pub dest: String,
    #[serde(default)]
    pub options_list: Vec<OptionEntry>,
    /// Raw argument type name as the loader reports it.
    #[serde(rename = "type", default)]
    pub arg_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub id_part: Option<String>,
    #[serde(default)]
    pub nargs: Option<Value>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub help: Option<String>,
    /// Arguments the loader injects for bookkeeping; never exported.
    #[serde(default)]
    pub ignore: bool,
    /// Declarative-backend schema, present on aaz commands.
    #[serde(default)]
    pub aaz: Option<AazArgRecord>,
}

/// Declarative-backend argument schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AazArgRecord {
    /// Schema class name, e.g. `AAZStrArg`.
    pub type_name: String,
    #[serde(default)]
    pub type_in_help: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
}

/// One entry of an argument's option list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionEntry {
    /// Plain option string.
    Name(String),
    /// Deprecated option alias.
    Deprecated {
        target: String,
        #[serde(default)]
        redirect: Option<String>,
        #[serde(default)]
        hide: bool,
        #[serde(default)]
        expiration: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_command_table_doc() {
        let doc: CommandTableDoc = serde_json::from_value(json!({
            "commands": [{
                "name": "monitor log-profiles create",
                "module": "monitor",
                "is_aaz": true,
                "arguments": [{
                    "dest": "name",
                    "options_list": [
                        "--name",
                        {"target": "--profile-name", "redirect": "--name", "hide": false}
                    ],
                    "required": true,
                    "aaz": {"type_name": "AAZStrArg", "type_in_help": "str"}
                }]
            }],
            "command_groups": {
                "monitor": {"desc": "Manage monitoring."}
            }
        }))
        .unwrap();
        assert_eq!(doc.commands.len(), 1);
        let arg = &doc.commands[0].arguments[0];
        assert!(arg.required);
        assert!(matches!(arg.options_list[1], OptionEntry::Deprecated { .. }));
        assert_eq!(doc.command_groups["monitor"].desc.as_deref(), Some("Manage monitoring."));
    }
}
