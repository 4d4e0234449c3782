//! Reclassification of raw deep-diff edits into typed change records.
//!
//! [`MetaChangeDetector`] walks the five deep-diff buckets, parses each
//! edit path, and emits [`Change`] records classified through the rule
//! table. Parameter-level edits are not taken from the raw buckets
//! directly: any edit below a command's `parameters` list only marks
//! the command, and the two parameter lists are then compared with a
//! matched-pair algorithm that tolerates index shifts and renames.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use cli_meta_core::{
    format_value, is_whitelisted_update, Change, CommandMetaRoot, Parameter, Result,
    CHECKED_PARA_PROPERTIES, CMD_PROPERTY_ADD_BREAK_LIST, CMD_PROPERTY_REMOVE_BREAK_LIST,
    CMD_PROPERTY_UPDATE_BREAK_LIST, PARA_PROPERTY_ADD_BREAK_LIST, PARA_PROPERTY_REMOVE_BREAK_LIST,
    PARA_PROPERTY_UPDATE_BREAK_LIST, PROPERTY_IGNORED_LIST, SUBGROUP_PROPERTY_ADD_BREAK_LIST,
    SUBGROUP_PROPERTY_REMOVE_BREAK_LIST, SUBGROUP_PROPERTY_UPDATE_BREAK_LIST,
};

use crate::deep::DeepDiff;
use crate::path::{PathKind, PathLocator};

/// Reads a suppression whitelist file: one tab-joined filter key per
/// line, blank lines ignored.
pub fn read_whitelist(path: &Path) -> Result<HashSet<String>> {
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Detects typed changes between two snapshots of one module.
pub struct MetaChangeDetector<'a> {
    base: &'a CommandMetaRoot,
    diff: &'a CommandMetaRoot,
    whitelist: HashSet<String>,
    changes: Vec<Change>,
    cmds_with_parameter_change: BTreeSet<String>,
}

impl<'a> MetaChangeDetector<'a> {
    /// Creates a detector; the two snapshots must describe the same
    /// module.
    pub fn new(base: &'a CommandMetaRoot, diff: &'a CommandMetaRoot) -> Result<Self> {
        base.check_same_module(diff)?;
        Ok(Self {
            base,
            diff,
            whitelist: HashSet::new(),
            changes: Vec::new(),
            cmds_with_parameter_change: BTreeSet::new(),
        })
    }

    /// Installs suppression entries matched against breaking changes'
    /// filter keys.
    pub fn with_whitelist(mut self, whitelist: HashSet<String>) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Runs the full detection pipeline and returns the ordered change
    /// list.
    pub fn detect(mut self) -> Result<Vec<Change>> {
        let raw = DeepDiff::compare(&self.base.to_value()?, &self.diff.to_value()?);
        if raw.is_empty() {
            debug!(module = %self.base.module_name, "snapshots are identical");
            return Ok(Vec::new());
        }

        for key in &raw.dictionary_item_removed {
            self.process_dict_item(key, false)?;
        }
        for key in &raw.dictionary_item_added {
            self.process_dict_item(key, true)?;
        }
        for key in raw.iterable_item_removed.keys() {
            self.process_list_item(key);
        }
        for key in raw.iterable_item_added.keys() {
            self.process_list_item(key);
        }
        for (key, change) in &raw.values_changed {
            self.process_value_change(key, &change.old_value, &change.new_value)?;
        }
        self.check_parameter_diffs()?;
        self.filter_by_whitelist();

        self.changes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(self.changes)
    }

    fn process_dict_item(&mut self, key: &str, added: bool) -> Result<()> {
        let Some(locator) = PathLocator::parse(key) else {
            warn!(key, "skipping unrecognized edit path");
            return Ok(());
        };
        match locator.kind {
            PathKind::Group => {
                let name = locator.subgroup_name.as_deref().unwrap_or_default();
                let change = if added {
                    Change::subgroup_add(name, false)?
                } else {
                    Change::subgroup_remove(name)?
                };
                self.changes.push(change);
            }
            PathKind::GroupProperty => {
                let name = locator.subgroup_name.as_deref().unwrap_or_default();
                let prop = locator.command_property.as_deref().unwrap_or_default();
                if PROPERTY_IGNORED_LIST.contains(&prop) {
                    return Ok(());
                }
                let change = if added {
                    let is_break = SUBGROUP_PROPERTY_ADD_BREAK_LIST.contains(&prop);
                    Change::subgroup_prop_add(name, prop, is_break)?
                } else {
                    let is_break = SUBGROUP_PROPERTY_REMOVE_BREAK_LIST.contains(&prop);
                    Change::subgroup_prop_remove(name, prop, is_break)?
                };
                self.changes.push(change);
            }
            PathKind::Command => {
                let name = locator.command_name.as_deref().unwrap_or_default();
                let change = if added {
                    Change::cmd_add(name, false)?
                } else {
                    Change::cmd_remove(name)?
                };
                self.changes.push(change);
            }
            PathKind::CommandProperty => {
                let name = locator.command_name.as_deref().unwrap_or_default();
                let prop = locator.command_property.as_deref().unwrap_or_default();
                if PROPERTY_IGNORED_LIST.contains(&prop) {
                    return Ok(());
                }
                let change = if added {
                    let is_break = CMD_PROPERTY_ADD_BREAK_LIST.contains(&prop);
                    Change::cmd_prop_add(name, prop, is_break)?
                } else {
                    let is_break = CMD_PROPERTY_REMOVE_BREAK_LIST.contains(&prop);
                    Change::cmd_prop_remove(name, prop, is_break)?
                };
                self.changes.push(change);
            }
            PathKind::Parameter | PathKind::ParameterProperty | PathKind::ParameterListElement => {
                if let Some(name) = locator.command_name {
                    self.cmds_with_parameter_change.insert(name);
                }
            }
        }
        Ok(())
    }

    fn process_list_item(&mut self, key: &str) {
        let Some(locator) = PathLocator::parse(key) else {
            warn!(key, "skipping unrecognized edit path");
            return;
        };
        if locator.command_property.as_deref() == Some("parameters") {
            if let Some(name) = locator.command_name {
                self.cmds_with_parameter_change.insert(name);
            }
        }
    }

    fn process_value_change(&mut self, key: &str, old: &Value, new: &Value) -> Result<()> {
        let Some(locator) = PathLocator::parse(key) else {
            warn!(key, "skipping unrecognized edit path");
            return Ok(());
        };
        match locator.kind {
            PathKind::CommandProperty => {
                let name = locator.command_name.as_deref().unwrap_or_default();
                let prop = locator.command_property.as_deref().unwrap_or_default();
                if PROPERTY_IGNORED_LIST.contains(&prop) {
                    return Ok(());
                }
                let old_value = format_value(old);
                let new_value = format_value(new);
                if is_whitelisted_update(prop, &old_value, &new_value) {
                    debug!(cmd = name, prop, "whitelisted transition skipped");
                    return Ok(());
                }
                let is_break = CMD_PROPERTY_UPDATE_BREAK_LIST.contains(&prop);
                self.changes
                    .push(Change::cmd_prop_update(name, prop, &old_value, &new_value, is_break)?);
            }
            PathKind::GroupProperty => {
                let name = locator.subgroup_name.as_deref().unwrap_or_default();
                let prop = locator.command_property.as_deref().unwrap_or_default();
                if PROPERTY_IGNORED_LIST.contains(&prop) {
                    return Ok(());
                }
                let old_value = format_value(old);
                let new_value = format_value(new);
                if is_whitelisted_update(prop, &old_value, &new_value) {
                    return Ok(());
                }
                let is_break = SUBGROUP_PROPERTY_UPDATE_BREAK_LIST.contains(&prop);
                self.changes.push(Change::subgroup_prop_update(
                    name, prop, &old_value, &new_value, is_break,
                )?);
            }
            PathKind::Parameter | PathKind::ParameterProperty | PathKind::ParameterListElement => {
                if let Some(name) = locator.command_name {
                    self.cmds_with_parameter_change.insert(name);
                }
            }
            // a group or command key never changes value on its own
            PathKind::Group | PathKind::Command => {}
        }
        Ok(())
    }

    fn check_parameter_diffs(&mut self) -> Result<()> {
        let cmd_names: Vec<String> = self.cmds_with_parameter_change.iter().cloned().collect();
        for cmd_name in cmd_names {
            let Some(base_cmd) = self.base.find_command(&cmd_name) else {
                warn!(cmd = %cmd_name, "command missing from base snapshot");
                continue;
            };
            let Some(diff_cmd) = self.diff.find_command(&cmd_name) else {
                warn!(cmd = %cmd_name, "command missing from new snapshot");
                continue;
            };
            self.compare_parameters(&cmd_name, &base_cmd.parameters, &diff_cmd.parameters)?;
        }
        Ok(())
    }

    /// Matched-pair comparison of two parameter lists.
    ///
    /// A base parameter matches the first new parameter with the same
    /// name, or whose option set contains all of the base options. This
    /// keeps renamed parameters paired instead of reporting a remove
    /// plus an add.
    fn compare_parameters(
        &mut self,
        cmd_name: &str,
        base_parameters: &[Parameter],
        diff_parameters: &[Parameter],
    ) -> Result<()> {
        let mut matched = vec![false; diff_parameters.len()];
        for base_para in base_parameters {
            let found = diff_parameters.iter().position(|candidate| {
                let base_options: HashSet<&str> = base_para.option_names().into_iter().collect();
                let new_options: HashSet<&str> = candidate.option_names().into_iter().collect();
                candidate.name == base_para.name || base_options.is_subset(&new_options)
            });
            let Some(index) = found else {
                self.changes.push(Change::para_remove(cmd_name, &base_para.name)?);
                continue;
            };
            matched[index] = true;
            self.compare_parameter_pair(cmd_name, base_para, &diff_parameters[index])?;
        }
        for (index, diff_para) in diff_parameters.iter().enumerate() {
            if matched[index] {
                continue;
            }
            let is_break = diff_para.required == Some(true);
            self.changes.push(Change::para_add(cmd_name, &diff_para.name, is_break)?);
        }
        Ok(())
    }

    fn compare_parameter_pair(
        &mut self,
        cmd_name: &str,
        base_para: &Parameter,
        diff_para: &Parameter,
    ) -> Result<()> {
        for prop in CHECKED_PARA_PROPERTIES {
            let base_val = parameter_property(base_para, prop);
            let diff_val = parameter_property(diff_para, prop);
            match (base_val, diff_val) {
                (None, None) => {}
                (Some(old), None) => {
                    let is_break = PARA_PROPERTY_REMOVE_BREAK_LIST.contains(prop);
                    self.changes.push(Change::para_prop_remove(
                        cmd_name,
                        &base_para.name,
                        prop,
                        &format_value(&old),
                        is_break,
                    )?);
                }
                (None, Some(new)) => {
                    let is_break = PARA_PROPERTY_ADD_BREAK_LIST.contains(prop);
                    self.changes.push(Change::para_prop_add(
                        cmd_name,
                        &base_para.name,
                        prop,
                        &format_value(&new),
                        is_break,
                    )?);
                }
                (Some(old), Some(new)) => {
                    if old == new {
                        continue;
                    }
                    let old_value = format_value(&old);
                    let new_value = format_value(&new);
                    if is_whitelisted_update(prop, &old_value, &new_value) {
                        continue;
                    }
                    let is_break = match (&old, &new) {
                        // a list that only grew keeps old callers working
                        (Value::Array(old_items), Value::Array(new_items)) => {
                            !is_value_subset(old_items, new_items)
                        }
                        _ => PARA_PROPERTY_UPDATE_BREAK_LIST.contains(prop),
                    };
                    self.changes.push(Change::para_prop_update(
                        cmd_name,
                        &base_para.name,
                        prop,
                        &old_value,
                        &new_value,
                        is_break,
                    )?);
                }
            }
        }
        Ok(())
    }

    fn filter_by_whitelist(&mut self) {
        if self.whitelist.is_empty() {
            return;
        }
        let whitelist = &self.whitelist;
        self.changes.retain(|change| {
            let suppressed = change.is_break
                && change
                    .filter_key()
                    .is_some_and(|key| whitelist.contains(&key));
            if suppressed {
                debug!(rule_id = change.rule_id, "change suppressed by whitelist");
            }
            !suppressed
        });
    }
}

fn is_value_subset(old_items: &[Value], new_items: &[Value]) -> bool {
    old_items.iter().all(|item| new_items.contains(item))
}

/// Reads one checked property off a parameter as a generic value.
///
/// `options` always reports the visible option strings; deprecated
/// entries contribute their names.
fn parameter_property(para: &Parameter, prop: &str) -> Option<Value> {
    match prop {
        "options" => Some(Value::Array(
            para.option_names()
                .into_iter()
                .map(|name| Value::String(name.to_string()))
                .collect(),
        )),
        "type" => para.param_type.clone().map(Value::String),
        "required" => para.required.map(Value::Bool),
        "choices" => para.choices.as_ref().map(|choices| {
            Value::Array(choices.iter().cloned().map(Value::String).collect())
        }),
        "id_part" => para.id_part.clone().map(Value::String),
        "nargs" => para.nargs.clone(),
        "default" => para.default.clone(),
        "aaz_type" => para.aaz_type.clone().map(Value::String),
        "aaz_default" => para.aaz_default.clone(),
        "aaz_choices" => para
            .aaz_choices
            .as_ref()
            .map(|choices| Value::Array(choices.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cli_meta_core::{Command, CommandMetaRoot, Parameter};

    fn base_root() -> CommandMetaRoot {
        let mut root = CommandMetaRoot::new("monitor");
        root.insert_command(
            Command::new("monitor log-profiles create")
                .with_parameter(
                    Parameter::new("name")
                        .with_options(&["--name", "-n"])
                        .required(),
                )
                .with_parameter(Parameter::new("location").with_options(&["--location", "-l"])),
        );
        root.insert_command(Command::new("monitor log-profiles show"));
        root
    }

    fn detect(base: &CommandMetaRoot, diff: &CommandMetaRoot) -> Vec<Change> {
        MetaChangeDetector::new(base, diff)
            .unwrap()
            .detect()
            .unwrap()
    }

    #[test]
    fn test_identical_snapshots_yield_no_changes() {
        let root = base_root();
        assert!(detect(&root, &root).is_empty());
    }

    #[test]
    fn test_removed_command_is_breaking() {
        let base = base_root();
        let mut diff = CommandMetaRoot::new("monitor");
        diff.insert_command(
            base.find_command("monitor log-profiles create")
                .unwrap()
                .clone(),
        );
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1002");
        assert!(changes[0].is_break);
        assert_eq!(
            changes[0].cmd_name.as_deref(),
            Some("monitor log-profiles show")
        );
    }

    #[test]
    fn test_removed_command_in_surviving_root_group() {
        let mut base = CommandMetaRoot::new("monitor");
        base.insert_command(Command::new("monitor clone"));
        base.insert_command(Command::new("monitor show"));
        let mut diff = CommandMetaRoot::new("monitor");
        diff.insert_command(Command::new("monitor show"));
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1002");
        assert!(changes[0].is_break);
        assert_eq!(changes[0].cmd_name.as_deref(), Some("monitor clone"));
    }

    #[test]
    fn test_added_optional_parameter_is_not_breaking() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters
            .push(Parameter::new("tags").with_options(&["--tags"]));
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1006");
        assert!(!changes[0].is_break);
        assert_eq!(changes[0].para_name.as_deref(), Some("tags"));
    }

    #[test]
    fn test_added_required_parameter_is_breaking() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters
            .push(Parameter::new("tags").with_options(&["--tags"]).required());
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1006");
        assert!(changes[0].is_break);
    }

    #[test]
    fn test_removed_parameter_is_breaking() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters.retain(|p| p.name != "location");
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1007");
        assert!(changes[0].is_break);
        assert_eq!(changes[0].para_name.as_deref(), Some("location"));
    }

    #[test]
    fn test_is_aaz_flip_to_true_is_suppressed() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.is_aaz = true;
        diff.insert_command(cmd);
        assert!(detect(&base, &diff).is_empty());
    }

    #[test]
    fn test_option_rename_is_breaking_list_update() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters[0] = Parameter::new("name")
            .with_options(&["--name", "--the-name"])
            .required();
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1010");
        assert!(changes[0].is_break);
        assert_eq!(changes[0].prop_name.as_deref(), Some("options"));
        assert_eq!(changes[0].old_value.as_deref(), Some("[--name -n]"));
        assert_eq!(changes[0].new_value.as_deref(), Some("[--name --the-name]"));
    }

    #[test]
    fn test_option_alias_addition_is_not_breaking() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters[1] = Parameter::new("location").with_options(&["--location", "--loc", "-l"]);
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1010");
        assert!(!changes[0].is_break);
    }

    #[test]
    fn test_confirmation_update_is_breaking() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles show")
            .unwrap()
            .clone();
        cmd.confirmation = Some(true);
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1003");
        assert!(changes[0].is_break);
        assert_eq!(changes[0].prop_name.as_deref(), Some("confirmation"));
    }

    #[test]
    fn test_subgroup_removal_is_breaking() {
        let base = base_root();
        let diff = CommandMetaRoot::new("monitor");
        let changes = detect(&base, &diff);
        assert!(changes
            .iter()
            .any(|c| c.rule_id == "1012" && c.is_break
                && c.subgroup_name.as_deref() == Some("monitor")));
    }

    #[test]
    fn test_desc_change_is_ignored() {
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles show")
            .unwrap()
            .clone();
        cmd.desc = Some("Show a log profile.".to_string());
        diff.insert_command(cmd);
        assert!(detect(&base, &diff).is_empty());
    }

    #[test]
    fn test_whitelist_suppresses_breaking_property_change() {
        let mut base = base_root();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters[1].default = Some(serde_json::json!("eastus"));
        base.insert_command(cmd.clone());
        let mut diff = base.clone();
        cmd.parameters[1].default = Some(serde_json::json!("westus"));
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].rule_id, "1010");
        assert!(changes[0].is_break);

        let mut whitelist = HashSet::new();
        whitelist.insert("1010\tmonitor log-profiles create\tlocation\tdefault".to_string());
        let filtered = MetaChangeDetector::new(&base, &diff)
            .unwrap()
            .with_whitelist(whitelist)
            .detect()
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_module_mismatch_is_rejected() {
        let base = CommandMetaRoot::new("monitor");
        let diff = CommandMetaRoot::new("network");
        assert!(MetaChangeDetector::new(&base, &diff).is_err());
    }

    #[test]
    fn test_diff_locality() {
        // a single-parameter edit only yields changes naming that command
        let base = base_root();
        let mut diff = base.clone();
        let mut cmd = base
            .find_command("monitor log-profiles create")
            .unwrap()
            .clone();
        cmd.parameters[1].id_part = Some("name".to_string());
        diff.insert_command(cmd);
        let changes = detect(&base, &diff);
        assert!(!changes.is_empty());
        for change in &changes {
            assert_eq!(
                change.cmd_name.as_deref(),
                Some("monitor log-profiles create")
            );
        }
    }
}
