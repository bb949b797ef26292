//! Kerning table data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix marking a pair key as a group reference
pub const GROUP_PREFIX: &str = "@";

/// Group name to member glyph names
pub type KerningGroups = BTreeMap<String, Vec<String>>;

/// Left key to right key to one value per source
pub type KerningValues = BTreeMap<String, BTreeMap<String, Vec<Option<f64>>>>;

/// One named kerning table
///
/// Groups are stored without the prefix; pair keys refer to them as
/// `@name`. A value array may be shorter than `source_identifiers`, missing
/// entries read as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernTable {
    pub groups_side1: KerningGroups,
    pub groups_side2: KerningGroups,
    pub source_identifiers: Vec<String>,
    pub values: KerningValues,
}

/// Pair key for a group name
pub fn group_key(group_name: &str) -> String {
    format!("{GROUP_PREFIX}{group_name}")
}

/// Group name of a pair key, `None` for glyph keys
pub fn group_name(key: &str) -> Option<&str> {
    key.strip_prefix(GROUP_PREFIX)
}

impl KernTable {
    pub fn pair_values(&self, left: &str, right: &str) -> Option<&Vec<Option<f64>>> {
        self.values.get(left).and_then(|row| row.get(right))
    }

    pub fn has_pair(&self, left: &str, right: &str) -> bool {
        self.pair_values(left, right).is_some()
    }

    pub fn source_index(&self, source_identifier: &str) -> Option<usize> {
        self.source_identifiers
            .iter()
            .position(|identifier| identifier == source_identifier)
    }

    /// Flat list of all pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, &Vec<Option<f64>>)> {
        self.values.iter().flat_map(|(left, row)| {
            row.iter()
                .map(move |(right, values)| (left.as_str(), right.as_str(), values))
        })
    }

    pub fn pair_count(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub(crate) fn set_pair_values(&mut self, left: &str, right: &str, values: Option<Vec<Option<f64>>>) {
        match values {
            Some(values) => {
                self.values
                    .entry(left.to_string())
                    .or_default()
                    .insert(right.to_string(), values);
            }
            None => {
                if let Some(row) = self.values.get_mut(left) {
                    row.remove(right);
                    if row.is_empty() {
                        self.values.remove(left);
                    }
                }
            }
        }
    }

    pub(crate) fn set_value(&mut self, left: &str, right: &str, index: usize, value: Option<f64>) {
        let values = self
            .values
            .entry(left.to_string())
            .or_default()
            .entry(right.to_string())
            .or_default();
        if values.len() <= index {
            values.resize(index + 1, None);
        }
        values[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_keys() {
        assert_eq!(group_key("O"), "@O");
        assert_eq!(group_name("@O"), Some("O"));
        assert_eq!(group_name("O"), None);
    }

    #[test]
    fn test_set_value_pads_and_creates() {
        let mut table = KernTable::default();
        table.set_value("V", "A", 2, Some(-50.0));
        assert_eq!(table.pair_values("V", "A"), Some(&vec![None, None, Some(-50.0)]));
        assert_eq!(table.pair_count(), 1);
    }

    #[test]
    fn test_removing_last_pair_removes_row() {
        let mut table = KernTable::default();
        table.set_pair_values("V", "A", Some(vec![Some(-100.0)]));
        table.set_pair_values("V", "O", Some(vec![Some(-20.0)]));
        table.set_pair_values("V", "A", None);
        assert!(table.values.contains_key("V"));
        table.set_pair_values("V", "O", None);
        assert!(table.values.is_empty());
        // Removing a missing pair is harmless
        table.set_pair_values("T", "o", None);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut table = KernTable::default();
        table.source_identifiers.push("regular".to_string());
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.get("groupsSide1").is_some());
        assert!(json.get("sourceIdentifiers").is_some());
    }
}
