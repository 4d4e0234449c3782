//! Rendering of change lists as text, flat objects, or a change tree.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::{json, Map, Value};
use tracing::debug;

use cli_meta_core::{canonical_json, Change, MetaError, Result, ROOT_NAME};

/// Output mode of a diff report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable line per change.
    #[default]
    Text,
    /// Flat JSON array of change objects.
    Dict,
    /// Pruned meta tree with change objects attached at their location.
    Tree,
}

impl FromStr for OutputFormat {
    type Err = MetaError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "text" => Ok(OutputFormat::Text),
            "dict" => Ok(OutputFormat::Dict),
            "tree" => Ok(OutputFormat::Tree),
            other => Err(MetaError::InvalidChangeRecord(format!(
                "unknown output format '{other}', expected text, dict, or tree"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Dict => write!(f, "dict"),
            OutputFormat::Tree => write!(f, "tree"),
        }
    }
}

/// A rendered diff report.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(Vec<String>),
    Dict(Value),
    Tree(Value),
}

impl Rendered {
    /// Serializes the report for display or persistence: text lines are
    /// newline-joined, JSON shapes use canonical formatting.
    pub fn to_output_string(&self) -> Result<String> {
        match self {
            Rendered::Text(lines) => Ok(lines.join("\n")),
            Rendered::Dict(value) | Rendered::Tree(value) => Ok(canonical_json(value)?),
        }
    }
}

/// Renders a change list in the requested format.
///
/// `only_break` drops non-breaking changes before rendering. List order
/// is preserved from the detector.
pub fn render_changes(
    changes: &[Change],
    module_name: &str,
    format: OutputFormat,
    only_break: bool,
) -> Result<Rendered> {
    let kept: Vec<&Change> = changes
        .iter()
        .filter(|change| !only_break || change.is_break)
        .collect();
    match format {
        OutputFormat::Text => Ok(Rendered::Text(
            kept.iter().map(|change| change.text_line()).collect(),
        )),
        OutputFormat::Dict => {
            let objs = kept
                .iter()
                .map(|change| serde_json::to_value(change))
                .collect::<serde_json::Result<Vec<Value>>>()?;
            Ok(Rendered::Dict(Value::Array(objs)))
        }
        OutputFormat::Tree => build_change_tree(&kept, module_name),
    }
}

/// Writes a rendered report to disk, creating parent directories as
/// needed.
pub fn write_output(rendered: &Rendered, path: &Path) -> Result<()> {
    let payload = rendered.to_output_string()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, payload)?;
    debug!(path = %path.display(), "diff report written");
    Ok(())
}

fn build_change_tree(changes: &[&Change], module_name: &str) -> Result<Rendered> {
    let mut tree = json!({
        "module_name": module_name,
        "name": ROOT_NAME,
        "commands": {},
        "sub_groups": {},
    });
    for change in changes {
        let obj = serde_json::to_value(change)?;
        match (&change.cmd_name, &change.subgroup_name) {
            (Some(cmd_name), _) => attach_cmd_rule(&mut tree, cmd_name, obj),
            (None, Some(subgroup_name)) => attach_subgroup_rule(&mut tree, subgroup_name, obj),
            (None, None) => debug!(rule_id = change.rule_id, "change without location skipped"),
        }
    }
    Ok(Rendered::Tree(tree))
}

/// Descends (creating as needed) the group nodes for every proper
/// prefix of a space-separated name, returning the node that owns the
/// final segment.
fn descend_groups<'t>(tree: &'t mut Value, name: &str) -> &'t mut Value {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let mut node = tree;
    for depth in 1..tokens.len() {
        let group_name = tokens[..depth].join(" ");
        let groups = node
            .as_object_mut()
            .expect("tree nodes are objects")
            .entry("sub_groups")
            .or_insert_with(|| Value::Object(Map::new()));
        node = groups
            .as_object_mut()
            .expect("sub_groups is an object")
            .entry(group_name.clone())
            .or_insert_with(|| {
                json!({
                    "name": group_name,
                    "commands": {},
                    "sub_groups": {},
                })
            });
    }
    node
}

fn attach_cmd_rule(tree: &mut Value, cmd_name: &str, rule: Value) {
    let owner = descend_groups(tree, cmd_name);
    let commands = owner
        .as_object_mut()
        .expect("tree nodes are objects")
        .entry("commands")
        .or_insert_with(|| Value::Object(Map::new()));
    let rules = commands
        .as_object_mut()
        .expect("commands is an object")
        .entry(cmd_name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = rules {
        items.push(rule);
    }
}

fn attach_subgroup_rule(tree: &mut Value, subgroup_name: &str, rule: Value) {
    let owner = descend_groups(tree, subgroup_name);
    let groups = owner
        .as_object_mut()
        .expect("tree nodes are objects")
        .entry("sub_groups")
        .or_insert_with(|| Value::Object(Map::new()));
    let entry = groups
        .as_object_mut()
        .expect("sub_groups is an object")
        .entry(subgroup_name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match entry {
        Value::Array(items) => items.push(rule),
        // the group also has descendants with changes; hang the rule off
        // the node instead of replacing it
        Value::Object(node) => {
            let rules = node
                .entry("rules")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = rules {
                items.push(rule);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_changes() -> Vec<Change> {
        vec![
            Change::cmd_remove("monitor log-profiles show").unwrap(),
            Change::para_add("monitor log-profiles create", "tags", false).unwrap(),
        ]
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("tree".parse::<OutputFormat>().unwrap(), OutputFormat::Tree);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_rendering() {
        let rendered =
            render_changes(&sample_changes(), "monitor", OutputFormat::Text, false).unwrap();
        let Rendered::Text(lines) = rendered else {
            panic!("expected text rendering");
        };
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("cmd `monitor log-profiles show` removed"));
        assert!(lines[0].contains("is_break: true"));
    }

    #[test]
    fn test_only_break_filters_non_breaking() {
        let rendered =
            render_changes(&sample_changes(), "monitor", OutputFormat::Dict, true).unwrap();
        let Rendered::Dict(Value::Array(items)) = rendered else {
            panic!("expected dict rendering");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["rule_id"], "1002");
        assert_eq!(items[0]["is_break"], true);
    }

    #[test]
    fn test_tree_rendering_groups_by_location() {
        let rendered =
            render_changes(&sample_changes(), "monitor", OutputFormat::Tree, false).unwrap();
        let Rendered::Tree(tree) = rendered else {
            panic!("expected tree rendering");
        };
        assert_eq!(tree["module_name"], "monitor");
        let rules = &tree["sub_groups"]["monitor"]["sub_groups"]["monitor log-profiles"]
            ["commands"]["monitor log-profiles show"];
        assert_eq!(rules.as_array().map(Vec::len), Some(1));
        assert_eq!(rules[0]["rule_name"], "cmd_remove");
    }

    #[test]
    fn test_subgroup_rule_attaches_to_group_node() {
        let changes = vec![Change::subgroup_remove("monitor log-profiles").unwrap()];
        let rendered = render_changes(&changes, "monitor", OutputFormat::Tree, false).unwrap();
        let Rendered::Tree(tree) = rendered else {
            panic!("expected tree rendering");
        };
        let rules =
            &tree["sub_groups"]["monitor"]["sub_groups"]["monitor log-profiles"];
        assert_eq!(rules.as_array().map(Vec::len), Some(1));
        assert_eq!(rules[0]["rule_id"], "1012");
    }

    #[test]
    fn test_write_output_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let rendered =
            render_changes(&sample_changes(), "monitor", OutputFormat::Dict, false).unwrap();
        write_output(&rendered, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }
}
