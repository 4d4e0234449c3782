//! Exports live command-table documents into canonical metadata
//! snapshots.
//!
//! The host CLI's command loader produces a [`CommandTableDoc`]; the
//! exporter walks it, normalizes argument metadata, and emits one
//! deterministic `az_<module>_meta.json` snapshot per module, ready for
//! the differ.
//!
//! # Example
//!
//! ```
//! use cli_meta_export::{build_modules_meta, CommandTableDoc, ExportOptions};
//!
//! let doc: CommandTableDoc = serde_json::from_str(r#"{
//!     "commands": [
//!         {"name": "monitor clone", "module": "monitor", "arguments": [
//!             {"dest": "name", "options_list": ["--name", "-n"], "required": true}
//!         ]}
//!     ]
//! }"#).unwrap();
//!
//! let metas = build_modules_meta(&doc, &ExportOptions::default());
//! let monitor = &metas["monitor"];
//! assert!(monitor.find_command("monitor clone").is_some());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use cli_meta_core::{
    Command, CommandMetaRoot, DeprecatedOption, OptionItem, Parameter, Result,
};

mod table;

pub use table::{AazArgRecord, ArgumentRecord, CommandRecord, CommandTableDoc, GroupRecord, OptionEntry};

/// What optional payload the snapshots carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Include short summaries on groups, commands, and parameters.
    pub with_help: bool,
    /// Include command examples.
    pub with_example: bool,
}

const TYPE_STRING_OPTS: &[&str] = &[
    "string",
    "str",
    "aazstrarg",
    "aazresourcelocationarg",
    "aazresourcegroupnamearg",
    "aazresourceidarg",
    "aazpaginationtokenarg",
    "aazfilearg",
];
const TYPE_INT_OPTS: &[&str] = &["int", "aazintarg", "aazpaginationlimitarg"];
const TYPE_FLOAT_OPTS: &[&str] = &["float", "aazfloatarg"];
const TYPE_BOOL_OPTS: &[&str] = &["boolean", "bool", "aazboolarg", "aazgenericupdateforcestringarg"];

/// Raw loader types the snapshot keeps verbatim; everything else
/// collapses to `custom_type`.
const KNOWN_RAW_TYPES: &[&str] = &["str", "int", "float", "bool", "file_type"];

/// Maps a raw type name onto the snapshot's normalized family name.
fn normalize_type_name(raw: &str) -> Option<&'static str> {
    let lowered = raw.to_ascii_lowercase();
    let lowered = lowered.as_str();
    if TYPE_STRING_OPTS.contains(&lowered) {
        Some("string")
    } else if TYPE_INT_OPTS.contains(&lowered) {
        Some("int")
    } else if TYPE_FLOAT_OPTS.contains(&lowered) {
        Some("float")
    } else if TYPE_BOOL_OPTS.contains(&lowered) {
        Some("bool")
    } else {
        None
    }
}

fn normalize_parameter_types(para: &mut Parameter) {
    if let Some(current) = &para.param_type {
        if let Some(normalized) = normalize_type_name(current) {
            para.param_type = Some(normalized.to_string());
        }
    }
    if let Some(current) = &para.aaz_type {
        if let Some(normalized) = normalize_type_name(current) {
            para.aaz_type = Some(normalized.to_string());
        }
    }
}

fn build_options(entries: &[OptionEntry]) -> Vec<OptionItem> {
    let mut options: Vec<OptionItem> = Vec::new();
    for entry in entries {
        match entry {
            OptionEntry::Name(name) => options.push(OptionItem::Name(name.clone())),
            OptionEntry::Deprecated {
                target,
                redirect,
                hide,
                expiration,
            } => {
                // hidden deprecated aliases are not part of the surface
                if *hide {
                    continue;
                }
                options.push(OptionItem::Deprecated(DeprecatedOption {
                    name: target.clone(),
                    redirect: redirect.clone(),
                    hide: None,
                    expiration: expiration.clone(),
                }));
            }
        }
    }
    options.sort_by(|a, b| a.name().cmp(b.name()));
    options.dedup_by(|a, b| a.name() == b.name());
    options
}

fn build_parameter(argument: &ArgumentRecord, is_aaz: bool, opts: &ExportOptions) -> Parameter {
    let mut para = Parameter::new(&argument.dest);
    para.options = build_options(&argument.options_list);
    if let Some(raw_type) = &argument.arg_type {
        para.param_type = Some(if KNOWN_RAW_TYPES.contains(&raw_type.as_str()) {
            raw_type.clone()
        } else {
            "custom_type".to_string()
        });
    }
    if argument.required {
        para.required = Some(true);
    }
    if let Some(choices) = &argument.choices {
        let mut sorted = choices.clone();
        sorted.sort();
        para.choices = Some(sorted);
    }
    para.id_part = argument.id_part.clone();
    para.nargs = argument.nargs.clone();
    para.default = argument.default.clone();
    if opts.with_help {
        para.desc = argument.help.clone();
    }
    if is_aaz {
        if let Some(aaz) = &argument.aaz {
            para.aaz_type = Some(aaz.type_name.clone());
            match &aaz.type_in_help {
                Some(type_in_help) if !type_in_help.eq_ignore_ascii_case("undefined") => {
                    para.param_type = Some(type_in_help.clone());
                }
                _ => {}
            }
            para.aaz_default = aaz.default.clone();
            para.aaz_choices = aaz.choices.clone();
        }
    }
    normalize_parameter_types(&mut para);
    para
}

/// Builds the snapshot node for one command.
pub fn gen_command_meta(record: &CommandRecord, opts: &ExportOptions) -> Command {
    let mut command = Command::new(&record.name);
    command.is_aaz = record.is_aaz;
    if record.confirmation {
        command.confirmation = Some(true);
    }
    if record.supports_no_wait {
        command.supports_no_wait = Some(true);
    }
    if record.is_preview {
        command.is_preview = Some(true);
    }
    if record.is_experimental {
        command.is_experimental = Some(true);
    }
    if opts.with_help {
        command.desc = record.desc.clone();
    }
    if opts.with_example {
        command.examples = record.examples.clone();
    }
    command.parameters = record
        .arguments
        .iter()
        .filter(|argument| !argument.ignore)
        .map(|argument| build_parameter(argument, record.is_aaz, opts))
        .collect();
    command
}

/// Builds one meta tree per module from a command-table document.
///
/// Commands are grouped by their `module` field; group descriptions are
/// attached from the document's group table when help is requested.
pub fn build_modules_meta(
    doc: &CommandTableDoc,
    opts: &ExportOptions,
) -> BTreeMap<String, CommandMetaRoot> {
    let mut metas: BTreeMap<String, CommandMetaRoot> = BTreeMap::new();
    for record in &doc.commands {
        let root = metas
            .entry(record.module.clone())
            .or_insert_with(|| CommandMetaRoot::new(&record.module));
        if root.find_command(&record.name).is_some() {
            warn!(command = %record.name, "repeated command skipped");
            continue;
        }
        root.insert_command(gen_command_meta(record, opts));
    }
    if opts.with_help {
        for root in metas.values_mut() {
            attach_group_help(&mut root.sub_groups, &doc.command_groups);
        }
    }
    metas
}

fn attach_group_help(
    groups: &mut BTreeMap<String, cli_meta_core::CommandGroup>,
    table: &BTreeMap<String, GroupRecord>,
) {
    for (name, group) in groups.iter_mut() {
        if let Some(record) = table.get(name) {
            group.desc = record.desc.clone();
        }
        attach_group_help(&mut group.sub_groups, table);
    }
}

/// Writes each module's snapshot as `az_<module>_meta.json` under
/// `output_path`, returning the written file paths.
pub fn write_modules_meta(
    metas: &BTreeMap<String, CommandMetaRoot>,
    output_path: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_path)?;
    let mut written = Vec::with_capacity(metas.len());
    for (module_name, root) in metas {
        let file_path = output_path.join(format!("az_{module_name}_meta.json"));
        fs::write(&file_path, root.to_canonical_json()?)?;
        written.push(file_path);
    }
    Ok(written)
}

/// Loads a command-table document from a JSON file and exports every
/// module's snapshot.
pub fn export_command_table(
    table_path: &Path,
    output_path: &Path,
    opts: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    let raw = fs::read_to_string(table_path)?;
    let doc: CommandTableDoc = serde_json::from_str(&raw)?;
    write_modules_meta(&build_modules_meta(&doc, opts), output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> CommandTableDoc {
        serde_json::from_value(json!({
            "commands": [
                {
                    "name": "monitor log-profiles create",
                    "module": "monitor",
                    "is_aaz": true,
                    "supports_no_wait": true,
                    "desc": "Create a log profile.",
                    "arguments": [
                        {
                            "dest": "name",
                            "options_list": [
                                "--name",
                                "-n",
                                {"target": "--profile-name", "redirect": "--name", "hide": false},
                                {"target": "--old-hidden", "hide": true}
                            ],
                            "required": true,
                            "aaz": {"type_name": "AAZStrArg", "type_in_help": "str"}
                        },
                        {
                            "dest": "categories",
                            "options_list": ["--categories"],
                            "type": "CategoriesList",
                            "choices": ["Write", "Delete", "Action"],
                            "nargs": "+"
                        },
                        {"dest": "cmd", "ignore": true}
                    ]
                },
                {
                    "name": "network vnet list",
                    "module": "network",
                    "arguments": [
                        {"dest": "resource_group_name", "options_list": ["--resource-group", "-g"], "type": "str"}
                    ]
                }
            ],
            "command_groups": {
                "monitor": {"desc": "Manage monitoring."},
                "monitor log-profiles": {"desc": "Manage log profiles."}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_commands_grouped_by_module() {
        let metas = build_modules_meta(&sample_doc(), &ExportOptions::default());
        assert_eq!(metas.len(), 2);
        assert!(metas["monitor"]
            .find_command("monitor log-profiles create")
            .is_some());
        assert!(metas["network"].find_command("network vnet list").is_some());
    }

    #[test]
    fn test_ignored_arguments_are_dropped() {
        let metas = build_modules_meta(&sample_doc(), &ExportOptions::default());
        let cmd = metas["monitor"]
            .find_command("monitor log-profiles create")
            .unwrap();
        assert_eq!(cmd.parameters.len(), 2);
        assert!(cmd.find_parameter("cmd").is_none());
    }

    #[test]
    fn test_options_sorted_and_hidden_deprecated_dropped() {
        let metas = build_modules_meta(&sample_doc(), &ExportOptions::default());
        let cmd = metas["monitor"]
            .find_command("monitor log-profiles create")
            .unwrap();
        let para = cmd.find_parameter("name").unwrap();
        assert_eq!(para.option_names(), vec!["--name", "--profile-name", "-n"]);
        assert!(matches!(para.options[1], OptionItem::Deprecated(_)));
    }

    #[test]
    fn test_type_normalization() {
        let metas = build_modules_meta(&sample_doc(), &ExportOptions::default());
        let cmd = metas["monitor"]
            .find_command("monitor log-profiles create")
            .unwrap();
        let name = cmd.find_parameter("name").unwrap();
        assert_eq!(name.param_type.as_deref(), Some("string"));
        assert_eq!(name.aaz_type.as_deref(), Some("string"));
        let categories = cmd.find_parameter("categories").unwrap();
        assert_eq!(categories.param_type.as_deref(), Some("custom_type"));
        assert_eq!(
            categories.choices.as_deref(),
            Some(&["Action".to_string(), "Delete".to_string(), "Write".to_string()][..])
        );
    }

    #[test]
    fn test_help_attached_only_when_requested() {
        let bare = build_modules_meta(&sample_doc(), &ExportOptions::default());
        let bare_cmd = bare["monitor"]
            .find_command("monitor log-profiles create")
            .unwrap();
        assert!(bare_cmd.desc.is_none());

        let opts = ExportOptions {
            with_help: true,
            with_example: false,
        };
        let with_help = build_modules_meta(&sample_doc(), &opts);
        let cmd = with_help["monitor"]
            .find_command("monitor log-profiles create")
            .unwrap();
        assert_eq!(cmd.desc.as_deref(), Some("Create a log profile."));
        let group = with_help["monitor"]
            .find_group("monitor log-profiles")
            .unwrap();
        assert_eq!(group.desc.as_deref(), Some("Manage log profiles."));
    }

    #[test]
    fn test_written_snapshots_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let metas = build_modules_meta(&sample_doc(), &ExportOptions::default());
        let first = write_modules_meta(&metas, dir.path()).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first[0].ends_with("az_monitor_meta.json"));
        let bytes_a = std::fs::read(&first[0]).unwrap();
        write_modules_meta(&metas, dir.path()).unwrap();
        let bytes_b = std::fs::read(&first[0]).unwrap();
        assert_eq!(bytes_a, bytes_b);

        let parsed = cli_meta_core::CommandMetaRoot::load(&first[0]).unwrap();
        assert_eq!(parsed, metas["monitor"]);
    }
}
