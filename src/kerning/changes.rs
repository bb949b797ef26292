//! Kerning changes
//!
//! Every edit is expressed as a [`KerningChange`]: an ordered list of
//! operations on one kerning table. Changes compose by concatenation and are
//! always produced together with the change that undoes them.

use super::table::KernTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupSide {
    Side1,
    Side2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum KerningOp {
    /// Create an empty table if none exists
    CreateTable,
    DeleteTable,
    SetSourceIdentifiers { source_identifiers: Vec<String> },
    /// Replace a group, or remove it with `None`
    SetGroup {
        side: GroupSide,
        name: String,
        glyphs: Option<Vec<String>>,
    },
    /// Set one cell, padding the value array as needed
    SetValue {
        left: String,
        right: String,
        index: usize,
        value: Option<f64>,
    },
    /// Replace a pair's whole value array, or remove the pair with `None`
    SetPairValues {
        left: String,
        right: String,
        values: Option<Vec<Option<f64>>>,
    },
}

impl KerningOp {
    /// Whether the op changes anything beyond the values of one pair
    pub fn is_structural(&self) -> bool {
        !matches!(self, KerningOp::SetValue { .. } | KerningOp::SetPairValues { .. })
    }

    /// The pair whose values this op touches
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self {
            KerningOp::SetValue { left, right, .. } | KerningOp::SetPairValues { left, right, .. } => {
                Some((left.as_str(), right.as_str()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KerningChange {
    pub kern_tag: String,
    pub ops: Vec<KerningOp>,
}

/// A change and its inverse
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePair {
    pub change: KerningChange,
    pub rollback_change: KerningChange,
}

impl KerningChange {
    pub fn new(kern_tag: impl Into<String>) -> Self {
        Self {
            kern_tag: kern_tag.into(),
            ops: Vec::new(),
        }
    }

    pub fn with_ops(kern_tag: impl Into<String>, ops: Vec<KerningOp>) -> Self {
        Self {
            kern_tag: kern_tag.into(),
            ops,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn push(&mut self, op: KerningOp) {
        self.ops.push(op);
    }

    /// `self` followed by `other`
    pub fn then(&self, other: &KerningChange) -> KerningChange {
        let mut ops = self.ops.clone();
        ops.extend(other.ops.iter().cloned());
        KerningChange {
            kern_tag: self.kern_tag.clone(),
            ops,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.ops.iter().any(KerningOp::is_structural)
    }

    /// Apply to a table slot. Value ops on a missing table are ignored.
    pub fn apply_to(&self, slot: &mut Option<KernTable>) {
        for op in &self.ops {
            match op {
                KerningOp::CreateTable => {
                    slot.get_or_insert_with(KernTable::default);
                }
                KerningOp::DeleteTable => {
                    *slot = None;
                }
                _ => {
                    if let Some(table) = slot.as_mut() {
                        apply_op(table, op);
                    }
                }
            }
        }
    }

    /// Apply to a font's tables by kern tag.
    pub fn apply_to_tables(&self, tables: &mut BTreeMap<String, KernTable>) {
        let mut slot = tables.remove(&self.kern_tag);
        self.apply_to(&mut slot);
        if let Some(table) = slot {
            tables.insert(self.kern_tag.clone(), table);
        }
    }
}

fn apply_op(table: &mut KernTable, op: &KerningOp) {
    match op {
        KerningOp::CreateTable | KerningOp::DeleteTable => {}
        KerningOp::SetSourceIdentifiers { source_identifiers } => {
            table.source_identifiers = source_identifiers.clone();
        }
        KerningOp::SetGroup { side, name, glyphs } => {
            let groups = match side {
                GroupSide::Side1 => &mut table.groups_side1,
                GroupSide::Side2 => &mut table.groups_side2,
            };
            match glyphs {
                Some(glyphs) => {
                    groups.insert(name.clone(), glyphs.clone());
                }
                None => {
                    groups.remove(name);
                }
            }
        }
        KerningOp::SetValue {
            left,
            right,
            index,
            value,
        } => table.set_value(left, right, *index, *value),
        KerningOp::SetPairValues { left, right, values } => {
            table.set_pair_values(left, right, values.clone())
        }
    }
}
