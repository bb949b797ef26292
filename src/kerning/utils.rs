//! Kerning table transformations
//!
//! Helpers for splitting, flipping and merging kerning tables, used when
//! kerning has to be prepared per writing direction.

use super::table::{group_key, group_name, KernTable, KerningGroups, KerningValues};
use super::KerningError;
use crate::text::GlyphMap;
use std::collections::{BTreeMap, BTreeSet};
use unicode_bidi::{bidi_class, BidiClass};

type FlatValues = BTreeMap<(String, String), Vec<Option<f64>>>;

fn unnest_values(values: &KerningValues) -> FlatValues {
    values
        .iter()
        .flat_map(|(left, row)| {
            row.iter()
                .map(move |(right, values)| ((left.clone(), right.clone()), values.clone()))
        })
        .collect()
}

fn nest_values(values: FlatValues) -> KerningValues {
    let mut nested = KerningValues::new();
    for ((left, right), values) in values {
        nested.entry(left).or_default().insert(right, values);
    }
    nested
}

/// Swap the sides of a table: side 1 groups become side 2 groups and every
/// pair is reversed.
pub fn flip_direction(table: &KernTable) -> KernTable {
    let flipped = unnest_values(&table.values)
        .into_iter()
        .map(|((left, right), values)| ((right, left), values))
        .collect();
    KernTable {
        groups_side1: table.groups_side2.clone(),
        groups_side2: table.groups_side1.clone(),
        source_identifiers: table.source_identifiers.clone(),
        values: nest_values(flipped),
    }
}

/// Merge two tables with the same sources. Conflicting group names in `b`
/// are renamed first; pairs in `b` win over pairs in `a`.
pub fn merge_kerning(a: &KernTable, b: &KernTable) -> Result<KernTable, KerningError> {
    if a.source_identifiers != b.source_identifiers {
        return Err(KerningError::IncompatibleSources);
    }
    let b = disambiguate_group_names(b, a, true);

    let mut groups_side1 = a.groups_side1.clone();
    groups_side1.extend(b.groups_side1);
    let mut groups_side2 = a.groups_side2.clone();
    groups_side2.extend(b.groups_side2);
    let mut values = unnest_values(&a.values);
    values.extend(unnest_values(&b.values));

    Ok(KernTable {
        groups_side1,
        groups_side2,
        source_identifiers: a.source_identifiers.clone(),
        values: nest_values(values),
    })
}

/// Rename groups of `table` whose names clash with groups of `other`.
///
/// Renamed groups get a `.1`, `.2`, ... suffix. With `allow_same_contents`
/// groups with identical members keep their name.
pub fn disambiguate_group_names(table: &KernTable, other: &KernTable, allow_same_contents: bool) -> KernTable {
    let side1_renames = conflict_renames(&table.groups_side1, &other.groups_side1, allow_same_contents);
    let side2_renames = conflict_renames(&table.groups_side2, &other.groups_side2, allow_same_contents);
    if side1_renames.is_empty() && side2_renames.is_empty() {
        return table.clone();
    }

    let rename_key = |key: &str, renames: &BTreeMap<String, String>| -> String {
        match group_name(key).and_then(|name| renames.get(name)) {
            Some(new_name) => group_key(new_name),
            None => key.to_string(),
        }
    };
    let values = table
        .values
        .iter()
        .map(|(left, row)| {
            let row = row
                .iter()
                .map(|(right, values)| (rename_key(right, &side2_renames), values.clone()))
                .collect();
            (rename_key(left, &side1_renames), row)
        })
        .collect();

    KernTable {
        groups_side1: rename_groups(&table.groups_side1, &side1_renames),
        groups_side2: rename_groups(&table.groups_side2, &side2_renames),
        source_identifiers: table.source_identifiers.clone(),
        values,
    }
}

fn conflict_renames(
    groups: &KerningGroups,
    other: &KerningGroups,
    allow_same_contents: bool,
) -> BTreeMap<String, String> {
    let mut used: BTreeSet<String> = groups.keys().chain(other.keys()).cloned().collect();
    let mut renames = BTreeMap::new();
    for (name, glyphs) in groups {
        let Some(other_glyphs) = other.get(name) else {
            continue;
        };
        if allow_same_contents && glyphs == other_glyphs {
            continue;
        }
        let new_name = (1..)
            .map(|count| format!("{name}.{count}"))
            .find(|candidate| !used.contains(candidate))
            .unwrap_or_else(|| name.clone());
        used.insert(new_name.clone());
        renames.insert(name.clone(), new_name);
    }
    renames
}

fn rename_groups(groups: &KerningGroups, renames: &BTreeMap<String, String>) -> KerningGroups {
    groups
        .iter()
        .map(|(name, glyphs)| (renames.get(name).unwrap_or(name).clone(), glyphs.clone()))
        .collect()
}

/// Groups split into (left to right, neutral, right to left)
pub fn classify_groups_by_direction(
    groups: &KerningGroups,
    ltr_glyphs: &BTreeSet<String>,
    rtl_glyphs: &BTreeSet<String>,
) -> (KerningGroups, KerningGroups, KerningGroups) {
    let mut ltr = KerningGroups::new();
    let mut neutral = KerningGroups::new();
    let mut rtl = KerningGroups::new();
    for (name, glyphs) in groups {
        let is_ltr = glyphs.iter().any(|glyph| ltr_glyphs.contains(glyph));
        let is_rtl = glyphs.iter().any(|glyph| rtl_glyphs.contains(glyph));
        let target = match (is_ltr, is_rtl) {
            (true, false) => &mut ltr,
            (false, true) => &mut rtl,
            _ => &mut neutral,
        };
        target.insert(name.clone(), glyphs.clone());
    }
    (ltr, neutral, rtl)
}

/// Glyphs with strong left-to-right and strong right-to-left characters.
pub fn classify_glyphs_by_direction(glyph_map: &GlyphMap) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut ltr = BTreeSet::new();
    let mut rtl = BTreeSet::new();
    for (glyph_name, characters) in glyph_map {
        for ch in characters {
            match bidi_class(*ch) {
                BidiClass::L => {
                    ltr.insert(glyph_name.clone());
                }
                BidiClass::R | BidiClass::AL => {
                    rtl.insert(glyph_name.clone());
                }
                _ => {}
            }
        }
    }
    (ltr, rtl)
}

/// Split a table into a left-to-right and a right-to-left table.
///
/// A pair goes right to left when either side is a right-to-left glyph or
/// group. Neutral groups are kept on whichever side uses them.
pub fn split_by_direction(
    table: &KernTable,
    ltr_glyphs: &BTreeSet<String>,
    rtl_glyphs: &BTreeSet<String>,
) -> (KernTable, KernTable) {
    let (ltr_side1, neutral_side1, rtl_side1) =
        classify_groups_by_direction(&table.groups_side1, ltr_glyphs, rtl_glyphs);
    let (ltr_side2, neutral_side2, rtl_side2) =
        classify_groups_by_direction(&table.groups_side2, ltr_glyphs, rtl_glyphs);

    let mut ltr_values = FlatValues::new();
    let mut rtl_values = FlatValues::new();
    for ((left, right), values) in unnest_values(&table.values) {
        let left_is_rtl = match group_name(&left) {
            Some(group) => rtl_side1.contains_key(group),
            None => rtl_glyphs.contains(&left),
        };
        let right_is_rtl = match group_name(&right) {
            Some(group) => rtl_side2.contains_key(group),
            None => rtl_glyphs.contains(&right),
        };
        if left_is_rtl || right_is_rtl {
            rtl_values.insert((left, right), values);
        } else {
            ltr_values.insert((left, right), values);
        }
    }

    let build = |mut side1: KerningGroups, mut side2: KerningGroups, values: FlatValues| {
        let (used_side1, used_side2) = used_groups(&neutral_side1, &neutral_side2, &values);
        side1.extend(used_side1);
        side2.extend(used_side2);
        KernTable {
            groups_side1: side1,
            groups_side2: side2,
            source_identifiers: table.source_identifiers.clone(),
            values: nest_values(values),
        }
    };

    (
        build(ltr_side1, ltr_side2, ltr_values),
        build(rtl_side1, rtl_side2, rtl_values),
    )
}

fn used_groups(
    side1: &KerningGroups,
    side2: &KerningGroups,
    values: &FlatValues,
) -> (KerningGroups, KerningGroups) {
    let used_left: BTreeSet<&str> = values.keys().filter_map(|(left, _)| group_name(left)).collect();
    let used_right: BTreeSet<&str> = values.keys().filter_map(|(_, right)| group_name(right)).collect();
    let filter = |groups: &KerningGroups, used: &BTreeSet<&str>| -> KerningGroups {
        groups
            .iter()
            .filter(|(name, _)| used.contains(name.as_str()))
            .map(|(name, glyphs)| (name.clone(), glyphs.clone()))
            .collect()
    };
    (filter(side1, &used_left), filter(side2, &used_right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn table(pairs: &[(&str, &str, f64)]) -> KernTable {
        let mut table = KernTable {
            source_identifiers: names(&["regular"]),
            ..Default::default()
        };
        for (left, right, value) in pairs {
            table.set_pair_values(left, right, Some(vec![Some(*value)]));
        }
        table
    }

    #[test]
    fn test_flip_direction() {
        let mut kerning = table(&[("V", "@O", -30.0)]);
        kerning.groups_side2.insert("O".to_string(), names(&["O", "Q"]));
        let flipped = flip_direction(&kerning);
        assert!(flipped.groups_side2.is_empty());
        assert_eq!(flipped.groups_side1["O"], names(&["O", "Q"]));
        assert_eq!(flipped.pair_values("@O", "V"), Some(&vec![Some(-30.0)]));
        assert_eq!(flip_direction(&flipped), kerning);
    }

    #[test]
    fn test_disambiguate_group_names() {
        let mut a = table(&[("@O", "A", -10.0)]);
        a.groups_side1.insert("O".to_string(), names(&["O"]));
        a.groups_side1.insert("same".to_string(), names(&["x"]));
        let mut b = KernTable::default();
        b.groups_side1.insert("O".to_string(), names(&["O", "Q"]));
        b.groups_side1.insert("O.1".to_string(), names(&["D"]));
        b.groups_side1.insert("same".to_string(), names(&["x"]));

        let renamed = disambiguate_group_names(&a, &b, true);
        assert_eq!(renamed.groups_side1["O.2"], names(&["O"]));
        assert!(renamed.groups_side1.contains_key("same"));
        assert!(renamed.has_pair("@O.2", "A"));

        let strict = disambiguate_group_names(&a, &b, false);
        assert!(strict.groups_side1.contains_key("same.1"));
    }

    #[test]
    fn test_merge_kerning() {
        let mut a = table(&[("@T", "o", -50.0), ("V", "A", -80.0)]);
        a.groups_side1.insert("T".to_string(), names(&["T"]));
        let mut b = table(&[("@T", "a", -40.0), ("V", "A", -90.0)]);
        b.groups_side1.insert("T".to_string(), names(&["T", "Tcaron"]));

        let merged = merge_kerning(&a, &b).unwrap();
        assert_eq!(merged.groups_side1["T"], names(&["T"]));
        assert_eq!(merged.groups_side1["T.1"], names(&["T", "Tcaron"]));
        assert!(merged.has_pair("@T", "o"));
        assert!(merged.has_pair("@T.1", "a"));
        assert_eq!(merged.pair_values("V", "A"), Some(&vec![Some(-90.0)]));

        let other_sources = KernTable::default();
        assert!(merge_kerning(&a, &other_sources).is_err());
    }

    #[test]
    fn test_split_by_direction() {
        let glyph_map: GlyphMap = [
            ("A".to_string(), vec!['A']),
            ("V".to_string(), vec!['V']),
            ("alef".to_string(), vec!['\u{0627}']),
            ("beh".to_string(), vec!['\u{0628}']),
            ("period".to_string(), vec!['.']),
        ]
        .into_iter()
        .collect();
        let (ltr_glyphs, rtl_glyphs) = classify_glyphs_by_direction(&glyph_map);
        assert!(ltr_glyphs.contains("A"));
        assert!(rtl_glyphs.contains("alef"));
        assert!(!ltr_glyphs.contains("period") && !rtl_glyphs.contains("period"));

        let mut kerning = table(&[
            ("V", "A", -80.0),
            ("alef", "beh", 20.0),
            ("@punct", "alef", 10.0),
        ]);
        kerning.groups_side1.insert("punct".to_string(), names(&["period"]));
        kerning.groups_side2.insert("arabic".to_string(), names(&["beh"]));

        let (ltr, rtl) = split_by_direction(&kerning, &ltr_glyphs, &rtl_glyphs);
        assert!(ltr.has_pair("V", "A"));
        assert_eq!(ltr.pair_count(), 1);
        assert!(ltr.groups_side1.is_empty());
        assert!(rtl.has_pair("alef", "beh"));
        assert!(rtl.has_pair("@punct", "alef"));
        assert!(rtl.groups_side1.contains_key("punct"));
        assert!(rtl.groups_side2.contains_key("arabic"));
    }
}
