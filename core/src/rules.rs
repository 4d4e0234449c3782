//! Rule table and breaking-change policy for metadata diffs.
//!
//! Every detectable change maps to a fixed four-digit rule id with a
//! message template and a suggestion template. Templates use positional
//! `{}` placeholders filled left to right by [`fill_template`]. The
//! breaking-property lists below decide whether a given property-level
//! change is reported as breaking.

use serde_json::Value;

/// One entry of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRule {
    /// Stable four-digit identifier.
    pub id: &'static str,
    /// Machine-friendly rule name.
    pub name: &'static str,
    /// Positional `{}` template for the human-readable message.
    pub message: &'static str,
    /// Positional `{}` template for the remediation hint.
    pub suggest: &'static str,
}

/// The full rule table, ordered by id.
pub const RULES: &[ChangeRule] = &[
    ChangeRule {
        id: "1001",
        name: "cmd_add",
        message: "cmd `{}` added",
        suggest: "please confirm cmd `{}` added",
    },
    ChangeRule {
        id: "1002",
        name: "cmd_remove",
        message: "cmd `{}` removed",
        suggest: "please confirm cmd `{}` removed",
    },
    ChangeRule {
        id: "1003",
        name: "cmd_prop_add",
        message: "cmd `{}` added property `{}`",
        suggest: "please remove property `{}` for cmd `{}`",
    },
    ChangeRule {
        id: "1004",
        name: "cmd_prop_remove",
        message: "cmd `{}` removed property `{}`",
        suggest: "please add back property `{}` for cmd `{}`",
    },
    ChangeRule {
        id: "1005",
        name: "cmd_prop_update",
        message: "cmd `{}` updated property `{}` from `{}` to `{}`",
        suggest: "please change property `{}` from `{}` back to `{}` for cmd `{}`",
    },
    ChangeRule {
        id: "1006",
        name: "para_add",
        message: "cmd `{}` added parameter `{}`",
        suggest: "please remove parameter `{}` for cmd `{}`",
    },
    ChangeRule {
        id: "1007",
        name: "para_remove",
        message: "cmd `{}` removed parameter `{}`",
        suggest: "please add back parameter `{}` for cmd `{}`",
    },
    ChangeRule {
        id: "1008",
        name: "para_prop_add",
        message: "cmd `{}` update parameter `{}`: added property `{}`=`{}`",
        suggest: "please remove property `{}`=`{}` for parameter `{}` of cmd `{}`",
    },
    ChangeRule {
        id: "1009",
        name: "para_prop_remove",
        message: "cmd `{}` update parameter `{}`: removed property `{}`=`{}`",
        suggest: "please add back property `{}`=`{}` for parameter `{}` of cmd `{}`",
    },
    ChangeRule {
        id: "1010",
        name: "para_prop_update",
        message: "cmd `{}` update parameter `{}`: updated property `{}` from `{}` to `{}`",
        suggest: "please change property `{}` from `{}` back to `{}` for parameter `{}` of cmd `{}`",
    },
    ChangeRule {
        id: "1011",
        name: "subgroup_add",
        message: "sub group `{}` added",
        suggest: "please confirm sub group `{}` added",
    },
    ChangeRule {
        id: "1012",
        name: "subgroup_remove",
        message: "sub group `{}` removed",
        suggest: "please confirm sub group `{}` removed",
    },
    ChangeRule {
        id: "1013",
        name: "subgroup_prop_add",
        message: "sub group `{}` added property `{}`",
        suggest: "please remove property `{}` for sub group `{}`",
    },
    ChangeRule {
        id: "1014",
        name: "subgroup_prop_remove",
        message: "sub group `{}` removed property `{}`",
        suggest: "please add back property `{}` for sub group `{}`",
    },
    ChangeRule {
        id: "1015",
        name: "subgroup_prop_update",
        message: "sub group `{}` updated property `{}` from `{}` to `{}`",
        suggest: "please change property `{}` from `{}` back to `{}` for sub group `{}`",
    },
];

/// Looks up a rule by id.
pub fn rule_by_id(id: &str) -> Option<&'static ChangeRule> {
    RULES.iter().find(|rule| rule.id == id)
}

/// Fills positional `{}` placeholders left to right.
///
/// Extra arguments are ignored; missing arguments leave the placeholder
/// in place so malformed records remain visible instead of panicking.
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut next = 0;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.get(next) {
            Some(arg) => out.push_str(arg),
            None => out.push_str("{}"),
        }
        next += 1;
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Command properties whose addition is breaking.
pub const CMD_PROPERTY_ADD_BREAK_LIST: &[&str] = &["confirmation"];

/// Command properties whose removal is breaking.
pub const CMD_PROPERTY_REMOVE_BREAK_LIST: &[&str] = &["supports_no_wait"];

/// Command properties whose value change is breaking.
pub const CMD_PROPERTY_UPDATE_BREAK_LIST: &[&str] = &["confirmation", "supports_no_wait"];

/// Parameter properties whose addition is breaking.
pub const PARA_PROPERTY_ADD_BREAK_LIST: &[&str] = &["required"];

/// Parameter properties whose removal is breaking.
pub const PARA_PROPERTY_REMOVE_BREAK_LIST: &[&str] = &["options", "required"];

/// Parameter properties whose value change is breaking.
pub const PARA_PROPERTY_UPDATE_BREAK_LIST: &[&str] =
    &["default", "type", "aaz_type", "id_part", "nargs"];

/// Group properties whose addition is breaking (none today).
pub const SUBGROUP_PROPERTY_ADD_BREAK_LIST: &[&str] = &[];

/// Group properties whose removal is breaking (none today).
pub const SUBGROUP_PROPERTY_REMOVE_BREAK_LIST: &[&str] = &[];

/// Group properties whose value change is breaking (none today).
pub const SUBGROUP_PROPERTY_UPDATE_BREAK_LIST: &[&str] = &[];

/// Descriptive properties whose changes are dropped at every level.
pub const PROPERTY_IGNORED_LIST: &[&str] = &["desc", "examples"];

/// Property transitions that are never breaking, as
/// `(property, old, new)` rendered values. Covers commands moving onto
/// the declarative back-end.
pub const UPDATE_WHITELISTED_TRANSITIONS: &[(&str, &str, &str)] = &[("is_aaz", "False", "True")];

/// Parameter properties compared by the matched-pair algorithm, in
/// comparison order.
pub const CHECKED_PARA_PROPERTIES: &[&str] = &[
    "options",
    "type",
    "required",
    "choices",
    "id_part",
    "nargs",
    "default",
    "aaz_type",
    "aaz_default",
    "aaz_choices",
];

/// Returns true when an update of `prop` from `old` to `new` (rendered
/// values) is whitelisted as non-breaking.
pub fn is_whitelisted_update(prop: &str, old: &str, new: &str) -> bool {
    UPDATE_WHITELISTED_TRANSITIONS
        .iter()
        .any(|(p, o, n)| *p == prop && *o == old && *n == new)
}

/// Renders a JSON value the way messages and filter keys expect it.
///
/// Strings are bare, booleans render capitalized like the snapshot
/// producers emit them, and lists render space-joined inside brackets.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(num) => num.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_table_is_complete_and_ordered() {
        assert_eq!(RULES.len(), 15);
        for window in RULES.windows(2) {
            assert!(window[0].id < window[1].id);
        }
        assert_eq!(rule_by_id("1005").unwrap().name, "cmd_prop_update");
        assert!(rule_by_id("1099").is_none());
    }

    #[test]
    fn test_fill_template() {
        assert_eq!(
            fill_template("cmd `{}` removed", &["monitor clone"]),
            "cmd `monitor clone` removed"
        );
        assert_eq!(
            fill_template(
                "cmd `{}` updated property `{}` from `{}` to `{}`",
                &["monitor clone", "is_aaz", "False", "True"]
            ),
            "cmd `monitor clone` updated property `is_aaz` from `False` to `True`"
        );
        // missing args keep the placeholder visible
        assert_eq!(fill_template("a `{}` b `{}`", &["x"]), "a `x` b `{}`");
    }

    #[test]
    fn test_whitelisted_update() {
        assert!(is_whitelisted_update("is_aaz", "False", "True"));
        assert!(!is_whitelisted_update("is_aaz", "True", "False"));
        assert!(!is_whitelisted_update("confirmation", "False", "True"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("standard")), "standard");
        assert_eq!(format_value(&json!(true)), "True");
        assert_eq!(format_value(&json!(null)), "None");
        assert_eq!(format_value(&json!(3)), "3");
        assert_eq!(format_value(&json!(["-n", "--name"])), "[-n --name]");
    }
}
