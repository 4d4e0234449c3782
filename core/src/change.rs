//! Change records produced by the structural differ.
//!
//! A [`Change`] couples a rule-table entry with the location it fired at
//! and the rendered old/new values. Constructors validate that the
//! locators a rule requires are present, fill the rule's message
//! template, and fill the suggestion template only for breaking
//! changes.

use serde::Serialize;

use crate::error::{MetaError, Result};
use crate::rules::{fill_template, rule_by_id, ChangeRule};

/// Which rule a change fired, with the locators each rule carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    CmdAdd,
    CmdRemove,
    CmdPropAdd,
    CmdPropRemove,
    CmdPropUpdate,
    ParaAdd,
    ParaRemove,
    ParaPropAdd,
    ParaPropRemove,
    ParaPropUpdate,
    SubgroupAdd,
    SubgroupRemove,
    SubgroupPropAdd,
    SubgroupPropRemove,
    SubgroupPropUpdate,
}

impl ChangeKind {
    /// Stable four-digit rule id for this kind.
    pub fn rule_id(&self) -> &'static str {
        match self {
            ChangeKind::CmdAdd => "1001",
            ChangeKind::CmdRemove => "1002",
            ChangeKind::CmdPropAdd => "1003",
            ChangeKind::CmdPropRemove => "1004",
            ChangeKind::CmdPropUpdate => "1005",
            ChangeKind::ParaAdd => "1006",
            ChangeKind::ParaRemove => "1007",
            ChangeKind::ParaPropAdd => "1008",
            ChangeKind::ParaPropRemove => "1009",
            ChangeKind::ParaPropUpdate => "1010",
            ChangeKind::SubgroupAdd => "1011",
            ChangeKind::SubgroupRemove => "1012",
            ChangeKind::SubgroupPropAdd => "1013",
            ChangeKind::SubgroupPropRemove => "1014",
            ChangeKind::SubgroupPropUpdate => "1015",
        }
    }

    fn rule(&self) -> &'static ChangeRule {
        rule_by_id(self.rule_id()).expect("rule table covers every kind")
    }

    /// Rank used for in-command ordering: additions before updates
    /// before removals.
    fn op_rank(&self) -> u8 {
        match self {
            ChangeKind::CmdAdd
            | ChangeKind::CmdPropAdd
            | ChangeKind::ParaAdd
            | ChangeKind::ParaPropAdd
            | ChangeKind::SubgroupAdd
            | ChangeKind::SubgroupPropAdd => 0,
            ChangeKind::CmdPropUpdate
            | ChangeKind::ParaPropUpdate
            | ChangeKind::SubgroupPropUpdate => 1,
            ChangeKind::CmdRemove
            | ChangeKind::CmdPropRemove
            | ChangeKind::ParaRemove
            | ChangeKind::ParaPropRemove
            | ChangeKind::SubgroupRemove
            | ChangeKind::SubgroupPropRemove => 2,
        }
    }

    /// Rank used for cross-scope ordering: groups, then commands, then
    /// parameters.
    fn scope_rank(&self) -> u8 {
        match self {
            ChangeKind::SubgroupAdd
            | ChangeKind::SubgroupRemove
            | ChangeKind::SubgroupPropAdd
            | ChangeKind::SubgroupPropRemove
            | ChangeKind::SubgroupPropUpdate => 0,
            ChangeKind::CmdAdd
            | ChangeKind::CmdRemove
            | ChangeKind::CmdPropAdd
            | ChangeKind::CmdPropRemove
            | ChangeKind::CmdPropUpdate => 1,
            ChangeKind::ParaAdd
            | ChangeKind::ParaRemove
            | ChangeKind::ParaPropAdd
            | ChangeKind::ParaPropRemove
            | ChangeKind::ParaPropUpdate => 2,
        }
    }
}

/// A single detected metadata change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    #[serde(skip)]
    pub kind: ChangeKind,
    pub rule_id: &'static str,
    pub rule_name: &'static str,
    pub is_break: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub para_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    pub rule_message: String,
    pub suggest_message: String,
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MetaError::InvalidChangeRecord(format!("{what} needed")));
    }
    Ok(())
}

impl Change {
    fn base(kind: ChangeKind, is_break: bool) -> Self {
        let rule = kind.rule();
        Self {
            rule_id: rule.id,
            rule_name: rule.name,
            kind,
            is_break,
            subgroup_name: None,
            cmd_name: None,
            para_name: None,
            prop_name: None,
            old_value: None,
            new_value: None,
            rule_message: String::new(),
            suggest_message: String::new(),
        }
    }

    fn fill(mut self, msg_args: &[&str], suggest_args: &[&str]) -> Self {
        let rule = self.kind.rule();
        self.rule_message = fill_template(rule.message, msg_args);
        if self.is_break {
            self.suggest_message = fill_template(rule.suggest, suggest_args);
        }
        self
    }

    /// Rule 1001: command added.
    pub fn cmd_add(cmd_name: &str, is_break: bool) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        let mut change = Change::base(ChangeKind::CmdAdd, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        Ok(change.fill(&[cmd_name], &[cmd_name]))
    }

    /// Rule 1002: command removed. Always breaking.
    pub fn cmd_remove(cmd_name: &str) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        let mut change = Change::base(ChangeKind::CmdRemove, true);
        change.cmd_name = Some(cmd_name.to_string());
        Ok(change.fill(&[cmd_name], &[cmd_name]))
    }

    /// Rule 1003: command property added.
    pub fn cmd_prop_add(cmd_name: &str, prop: &str, is_break: bool) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(prop, "cmd property")?;
        let mut change = Change::base(ChangeKind::CmdPropAdd, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.prop_name = Some(prop.to_string());
        Ok(change.fill(&[cmd_name, prop], &[prop, cmd_name]))
    }

    /// Rule 1004: command property removed.
    pub fn cmd_prop_remove(cmd_name: &str, prop: &str, is_break: bool) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(prop, "cmd property")?;
        let mut change = Change::base(ChangeKind::CmdPropRemove, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.prop_name = Some(prop.to_string());
        Ok(change.fill(&[cmd_name, prop], &[prop, cmd_name]))
    }

    /// Rule 1005: command property updated.
    pub fn cmd_prop_update(
        cmd_name: &str,
        prop: &str,
        old: &str,
        new: &str,
        is_break: bool,
    ) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(prop, "cmd property")?;
        let mut change = Change::base(ChangeKind::CmdPropUpdate, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.prop_name = Some(prop.to_string());
        change.old_value = Some(old.to_string());
        change.new_value = Some(new.to_string());
        Ok(change.fill(&[cmd_name, prop, old, new], &[prop, new, old, cmd_name]))
    }

    /// Rule 1006: parameter added.
    pub fn para_add(cmd_name: &str, para_name: &str, is_break: bool) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(para_name, "parameter name")?;
        let mut change = Change::base(ChangeKind::ParaAdd, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.para_name = Some(para_name.to_string());
        Ok(change.fill(&[cmd_name, para_name], &[para_name, cmd_name]))
    }

    /// Rule 1007: parameter removed. Always breaking.
    pub fn para_remove(cmd_name: &str, para_name: &str) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(para_name, "parameter name")?;
        let mut change = Change::base(ChangeKind::ParaRemove, true);
        change.cmd_name = Some(cmd_name.to_string());
        change.para_name = Some(para_name.to_string());
        Ok(change.fill(&[cmd_name, para_name], &[para_name, cmd_name]))
    }

    /// Rule 1008: parameter property added.
    pub fn para_prop_add(
        cmd_name: &str,
        para_name: &str,
        prop: &str,
        value: &str,
        is_break: bool,
    ) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(para_name, "parameter name")?;
        require(prop, "parameter property")?;
        let mut change = Change::base(ChangeKind::ParaPropAdd, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.para_name = Some(para_name.to_string());
        change.prop_name = Some(prop.to_string());
        change.new_value = Some(value.to_string());
        Ok(change.fill(
            &[cmd_name, para_name, prop, value],
            &[prop, value, para_name, cmd_name],
        ))
    }

    /// Rule 1009: parameter property removed.
    pub fn para_prop_remove(
        cmd_name: &str,
        para_name: &str,
        prop: &str,
        value: &str,
        is_break: bool,
    ) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(para_name, "parameter name")?;
        require(prop, "parameter property")?;
        let mut change = Change::base(ChangeKind::ParaPropRemove, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.para_name = Some(para_name.to_string());
        change.prop_name = Some(prop.to_string());
        change.old_value = Some(value.to_string());
        Ok(change.fill(
            &[cmd_name, para_name, prop, value],
            &[prop, value, para_name, cmd_name],
        ))
    }

    /// Rule 1010: parameter property updated.
    pub fn para_prop_update(
        cmd_name: &str,
        para_name: &str,
        prop: &str,
        old: &str,
        new: &str,
        is_break: bool,
    ) -> Result<Self> {
        require(cmd_name, "cmd name")?;
        require(para_name, "parameter name")?;
        require(prop, "parameter property")?;
        let mut change = Change::base(ChangeKind::ParaPropUpdate, is_break);
        change.cmd_name = Some(cmd_name.to_string());
        change.para_name = Some(para_name.to_string());
        change.prop_name = Some(prop.to_string());
        change.old_value = Some(old.to_string());
        change.new_value = Some(new.to_string());
        Ok(change.fill(
            &[cmd_name, para_name, prop, old, new],
            &[prop, new, old, para_name, cmd_name],
        ))
    }

    /// Rule 1011: sub group added.
    pub fn subgroup_add(subgroup_name: &str, is_break: bool) -> Result<Self> {
        require(subgroup_name, "sub group name")?;
        let mut change = Change::base(ChangeKind::SubgroupAdd, is_break);
        change.subgroup_name = Some(subgroup_name.to_string());
        Ok(change.fill(&[subgroup_name], &[subgroup_name]))
    }

    /// Rule 1012: sub group removed. Always breaking.
    pub fn subgroup_remove(subgroup_name: &str) -> Result<Self> {
        require(subgroup_name, "sub group name")?;
        let mut change = Change::base(ChangeKind::SubgroupRemove, true);
        change.subgroup_name = Some(subgroup_name.to_string());
        Ok(change.fill(&[subgroup_name], &[subgroup_name]))
    }

    /// Rule 1013: sub group property added.
    pub fn subgroup_prop_add(subgroup_name: &str, prop: &str, is_break: bool) -> Result<Self> {
        require(subgroup_name, "sub group name")?;
        require(prop, "sub group property")?;
        let mut change = Change::base(ChangeKind::SubgroupPropAdd, is_break);
        change.subgroup_name = Some(subgroup_name.to_string());
        change.prop_name = Some(prop.to_string());
        Ok(change.fill(&[subgroup_name, prop], &[prop, subgroup_name]))
    }

    /// Rule 1014: sub group property removed.
    pub fn subgroup_prop_remove(subgroup_name: &str, prop: &str, is_break: bool) -> Result<Self> {
        require(subgroup_name, "sub group name")?;
        require(prop, "sub group property")?;
        let mut change = Change::base(ChangeKind::SubgroupPropRemove, is_break);
        change.subgroup_name = Some(subgroup_name.to_string());
        change.prop_name = Some(prop.to_string());
        Ok(change.fill(&[subgroup_name, prop], &[prop, subgroup_name]))
    }

    /// Rule 1015: sub group property updated.
    pub fn subgroup_prop_update(
        subgroup_name: &str,
        prop: &str,
        old: &str,
        new: &str,
        is_break: bool,
    ) -> Result<Self> {
        require(subgroup_name, "sub group name")?;
        require(prop, "sub group property")?;
        let mut change = Change::base(ChangeKind::SubgroupPropUpdate, is_break);
        change.subgroup_name = Some(subgroup_name.to_string());
        change.prop_name = Some(prop.to_string());
        change.old_value = Some(old.to_string());
        change.new_value = Some(new.to_string());
        Ok(change.fill(
            &[subgroup_name, prop, old, new],
            &[prop, new, old, subgroup_name],
        ))
    }

    /// One-line text rendering: message, break flag, and the suggestion
    /// when one exists.
    pub fn text_line(&self) -> String {
        let mut parts = vec![self.rule_message.clone()];
        if self.is_break {
            parts.push(format!("is_break: {}", self.is_break));
            if !self.suggest_message.is_empty() {
                parts.push(self.suggest_message.clone());
            }
        }
        parts.join(" | ")
    }

    /// Tab-joined key matched against suppression whitelist entries.
    ///
    /// Only property-level rules carry a filter key; add/remove of whole
    /// commands, groups, and parameters cannot be suppressed.
    pub fn filter_key(&self) -> Option<String> {
        let mut parts: Vec<&str> = vec![self.rule_id];
        match self.kind {
            ChangeKind::CmdPropAdd | ChangeKind::CmdPropRemove | ChangeKind::CmdPropUpdate => {
                parts.push(self.cmd_name.as_deref()?);
                parts.push(self.prop_name.as_deref()?);
            }
            ChangeKind::ParaPropAdd | ChangeKind::ParaPropRemove | ChangeKind::ParaPropUpdate => {
                parts.push(self.cmd_name.as_deref()?);
                parts.push(self.para_name.as_deref()?);
                parts.push(self.prop_name.as_deref()?);
            }
            ChangeKind::SubgroupPropAdd
            | ChangeKind::SubgroupPropRemove
            | ChangeKind::SubgroupPropUpdate => {
                parts.push(self.subgroup_name.as_deref()?);
                parts.push(self.prop_name.as_deref()?);
            }
            _ => return None,
        }
        Some(parts.join("\t"))
    }

    /// Sort key giving the report its stable emission order: groups
    /// before commands before parameters, grouped by location, with
    /// additions before updates before removals inside a location.
    pub fn sort_key(&self) -> (u8, String, String, u8, &'static str) {
        (
            self.kind.scope_rank(),
            self.subgroup_name.clone().unwrap_or_default(),
            self.cmd_name.clone().unwrap_or_default(),
            self.kind.op_rank(),
            self.rule_id,
        )
    }
}
