//! One glyph per character, for fonts without a compiled binary

use super::{
    is_mark_character, GlyphAdvances, GlyphFlags, NominalGlyphs, ShapeOptions, ShapedGlyph,
    Shaper, DEFAULT_ADVANCE, NOTDEF_GLYPH,
};
use crate::text::CharacterMap;
use std::collections::BTreeSet;

/// Shaper that maps characters straight through the character map
///
/// No substitution, no positioning, no reordering: text is laid out left to
/// right in logical order, one cluster per character.
#[derive(Debug, Clone, Default)]
pub struct FallbackShaper {
    nominal_glyphs: NominalGlyphs,
}

impl FallbackShaper {
    pub fn new(character_map: CharacterMap) -> Self {
        Self {
            nominal_glyphs: NominalGlyphs::new(character_map),
        }
    }
}

impl Shaper for FallbackShaper {
    fn shape(&self, text: &str, advances: &GlyphAdvances, _options: &ShapeOptions) -> Vec<ShapedGlyph> {
        text.chars()
            .enumerate()
            .map(|(cluster, ch)| {
                let glyph_name = self
                    .nominal_glyphs
                    .glyph_name(ch)
                    .unwrap_or(NOTDEF_GLYPH)
                    .to_string();
                let x_advance = advances.get(&glyph_name).copied().unwrap_or(DEFAULT_ADVANCE);
                ShapedGlyph {
                    cluster,
                    glyph_name,
                    glyph_id: None,
                    x_advance,
                    y_advance: 0.0,
                    x_offset: 0.0,
                    y_offset: 0.0,
                    is_mark: is_mark_character(ch),
                    flags: GlyphFlags::empty(),
                }
            })
            .collect()
    }

    fn feature_tags(&self, _table_tag: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn nominal_glyphs(&self) -> &NominalGlyphs {
        &self.nominal_glyphs
    }

    fn nominal_glyphs_mut(&mut self) -> &mut NominalGlyphs {
        &mut self.nominal_glyphs
    }

    fn close(self: Box<Self>) {}
}
