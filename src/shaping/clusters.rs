//! Character to glyph cluster mapping
//!
//! Shapers report, per glyph, the index of the first character of its
//! cluster. The order of glyphs says nothing about character ranges (RTL
//! runs come out descending), so cluster extents are taken from the sorted
//! set of distinct boundaries: a cluster runs from its boundary up to the
//! next larger one.

use std::collections::BTreeSet;

/// Glyph to character and character to glyph index sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMapping {
    pub glyph_to_chars: Vec<BTreeSet<usize>>,
    pub char_to_glyphs: Vec<BTreeSet<usize>>,
}

impl ClusterMapping {
    pub fn glyphs_for_char(&self, char_index: usize) -> impl Iterator<Item = usize> + '_ {
        self.char_to_glyphs
            .get(char_index)
            .into_iter()
            .flat_map(|glyphs| glyphs.iter().copied())
    }

    pub fn chars_for_glyph(&self, glyph_index: usize) -> impl Iterator<Item = usize> + '_ {
        self.glyph_to_chars
            .get(glyph_index)
            .into_iter()
            .flat_map(|chars| chars.iter().copied())
    }
}

/// Build the two-way mapping for one shaped run.
///
/// `clusters` has one entry per glyph. Out of range cluster values are
/// clamped to the last character, and characters before the smallest
/// boundary are attached to the first cluster, so every character and every
/// glyph ends up in at least one entry when both counts are non-zero.
pub fn build_mapping(clusters: &[usize], num_chars: usize) -> ClusterMapping {
    let mut mapping = ClusterMapping {
        glyph_to_chars: vec![BTreeSet::new(); clusters.len()],
        char_to_glyphs: vec![BTreeSet::new(); num_chars],
    };
    if num_chars == 0 || clusters.is_empty() {
        return mapping;
    }

    let clamp = |cluster: usize| cluster.min(num_chars - 1);
    let boundaries: Vec<usize> = clusters
        .iter()
        .map(|cluster| clamp(*cluster))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    for (glyph_index, cluster) in clusters.iter().enumerate() {
        let start = clamp(*cluster);
        let position = boundaries.partition_point(|boundary| *boundary < start);
        let range_start = if position == 0 { 0 } else { start };
        let range_end = boundaries.get(position + 1).copied().unwrap_or(num_chars);
        for char_index in range_start..range_end {
            mapping.glyph_to_chars[glyph_index].insert(char_index);
            mapping.char_to_glyphs[char_index].insert(glyph_index);
        }
    }

    mapping
}
