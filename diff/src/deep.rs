//! Generic recursive structural diff over JSON values.
//!
//! Compares two value trees and sorts every divergence into five edit
//! buckets, keyed by bracketed path strings rooted at `root`, e.g.
//! `root['sub_groups']['monitor']['commands']['monitor clone']['confirmation']`.
//! Object keys are quoted, list indices are bare.

use std::collections::BTreeMap;

use serde_json::Value;

/// Old and new value of a scalar change.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub old_value: Value,
    pub new_value: Value,
}

/// Raw edit buckets produced by [`DeepDiff::compare`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepDiff {
    /// Object keys present only in the new tree.
    pub dictionary_item_added: Vec<String>,
    /// Object keys present only in the old tree.
    pub dictionary_item_removed: Vec<String>,
    /// List elements present only in the new tree, by path.
    pub iterable_item_added: BTreeMap<String, Value>,
    /// List elements present only in the old tree, by path.
    pub iterable_item_removed: BTreeMap<String, Value>,
    /// Leaf values that differ, by path.
    pub values_changed: BTreeMap<String, ValueChange>,
}

impl DeepDiff {
    /// Diffs `base` against `diff`, treating `base` as the old tree.
    pub fn compare(base: &Value, diff: &Value) -> Self {
        let mut out = DeepDiff::default();
        out.walk("root", base, diff);
        out
    }

    /// True when the two trees were identical.
    pub fn is_empty(&self) -> bool {
        self.dictionary_item_added.is_empty()
            && self.dictionary_item_removed.is_empty()
            && self.iterable_item_added.is_empty()
            && self.iterable_item_removed.is_empty()
            && self.values_changed.is_empty()
    }

    fn walk(&mut self, path: &str, base: &Value, diff: &Value) {
        match (base, diff) {
            (Value::Object(base_map), Value::Object(diff_map)) => {
                for (key, base_val) in base_map {
                    let child = format!("{path}['{key}']");
                    match diff_map.get(key) {
                        Some(diff_val) => self.walk(&child, base_val, diff_val),
                        None => self.dictionary_item_removed.push(child),
                    }
                }
                for key in diff_map.keys() {
                    if !base_map.contains_key(key) {
                        self.dictionary_item_added.push(format!("{path}['{key}']"));
                    }
                }
            }
            (Value::Array(base_items), Value::Array(diff_items)) => {
                let common = base_items.len().min(diff_items.len());
                for index in 0..common {
                    let child = format!("{path}[{index}]");
                    self.walk(&child, &base_items[index], &diff_items[index]);
                }
                for (index, item) in base_items.iter().enumerate().skip(common) {
                    self.iterable_item_removed
                        .insert(format!("{path}[{index}]"), item.clone());
                }
                for (index, item) in diff_items.iter().enumerate().skip(common) {
                    self.iterable_item_added
                        .insert(format!("{path}[{index}]"), item.clone());
                }
            }
            _ => {
                if base != diff {
                    self.values_changed.insert(
                        path.to_string(),
                        ValueChange {
                            old_value: base.clone(),
                            new_value: diff.clone(),
                        },
                    );
                }
            }
        }
    }
}
