//! Engine-backed shaping with harfrust
//!
//! The engine only knows the compiled binary, so two things are reconciled
//! after each call: glyph names come from the editor's character map where
//! the engine picked the nominal glyph, and advances are swapped for the
//! editor's current advances while keeping positioning adjustments.

use super::{
    is_mark_character, GlyphAdvances, GlyphFlags, NominalGlyphs, ShapeOptions, ShapedGlyph,
    Shaper, ShaperError,
};
use crate::text::CharacterMap;
use harfrust::{Feature, ShaperData, ShaperInstance, UnicodeBuffer, Variation};
use skrifa::instance::{LocationRef, Size};
use skrifa::raw::TableProvider;
use skrifa::{GlyphId, GlyphNames, MetadataProvider};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shaper backed by a compiled font binary
pub struct HarfRustShaper {
    font_data: Arc<[u8]>,
    shaper_data: ShaperData,
    glyph_names: Vec<Option<String>>,
    nominal_glyphs: NominalGlyphs,
}

impl HarfRustShaper {
    pub fn new(font_data: Arc<[u8]>, character_map: CharacterMap) -> Result<Self, ShaperError> {
        let font = harfrust::FontRef::from_index(&font_data, 0)
            .map_err(|e| ShaperError::InvalidFont(format!("{e:?}")))?;
        let shaper_data = ShaperData::new(&font);

        let skrifa_font = skrifa::FontRef::from_index(&font_data, 0)
            .map_err(|e| ShaperError::InvalidFont(format!("{e:?}")))?;
        let glyph_count = skrifa_font
            .maxp()
            .map(|maxp| maxp.num_glyphs() as u32)
            .unwrap_or_default();
        let names = GlyphNames::new(&skrifa_font);
        let glyph_names = (0..glyph_count)
            .map(|gid| names.get(GlyphId::new(gid)).map(|name| name.as_str().to_string()))
            .collect();

        debug!("Opened font binary with {} glyphs", glyph_count);

        Ok(Self {
            font_data,
            shaper_data,
            glyph_names,
            nominal_glyphs: NominalGlyphs::new(character_map),
        })
    }

    fn binary_glyph_name(&self, glyph_id: u32) -> String {
        self.glyph_names
            .get(glyph_id as usize)
            .cloned()
            .flatten()
            .unwrap_or_else(|| format!("gid{glyph_id}"))
    }
}

/// Parse `tag=value` pairs into engine variations, skipping bad tags.
fn engine_variations(options: &ShapeOptions) -> Vec<Variation> {
    options
        .variations
        .iter()
        .filter_map(|(tag, value)| match Variation::from_str(&format!("{tag}={value}")) {
            Ok(variation) => Some(variation),
            Err(_) => {
                warn!("Ignoring invalid variation axis tag '{}'", tag);
                None
            }
        })
        .collect()
}

fn engine_features(options: &ShapeOptions) -> Vec<Feature> {
    options
        .features
        .iter()
        .filter_map(|setting| match Feature::from_str(setting) {
            Ok(feature) => Some(feature),
            Err(_) => {
                warn!("Ignoring invalid feature setting '{}'", setting);
                None
            }
        })
        .collect()
}

/// Character index for every byte offset of `text`, plus one past the end.
fn byte_to_char_indices(text: &str) -> Vec<usize> {
    let mut indices = vec![0; text.len() + 1];
    let mut char_index = 0;
    for (byte_index, ch) in text.char_indices() {
        for slot in &mut indices[byte_index..byte_index + ch.len_utf8()] {
            *slot = char_index;
        }
        char_index += 1;
    }
    indices[text.len()] = char_index;
    indices
}

impl Shaper for HarfRustShaper {
    fn shape(&self, text: &str, advances: &GlyphAdvances, options: &ShapeOptions) -> Vec<ShapedGlyph> {
        let Ok(font) = harfrust::FontRef::from_index(&self.font_data, 0) else {
            return Vec::new();
        };
        let Ok(skrifa_font) = skrifa::FontRef::from_index(&self.font_data, 0) else {
            return Vec::new();
        };

        let variations = engine_variations(options);
        let instance = ShaperInstance::from_variations(&font, &variations);
        let shaper = self
            .shaper_data
            .shaper(&font)
            .instance(Some(&instance))
            .build();

        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let glyph_buffer = shaper.shape(buffer, &engine_features(options));

        let location = skrifa_font.axes().location(
            options
                .variations
                .iter()
                .map(|(tag, value)| (tag.as_str(), *value as f32)),
        );
        let metrics = skrifa_font.glyph_metrics(Size::unscaled(), LocationRef::new(location.coords()));
        let charmap = skrifa_font.charmap();

        let chars: Vec<char> = text.chars().collect();
        let byte_to_char = byte_to_char_indices(text);

        glyph_buffer
            .glyph_infos()
            .iter()
            .zip(glyph_buffer.glyph_positions())
            .map(|(info, position)| {
                let cluster = byte_to_char
                    .get(info.cluster as usize)
                    .copied()
                    .unwrap_or(chars.len());
                let source_char = chars.get(cluster).copied();

                // Where the engine used the cmap glyph, the editor's mapping wins
                let is_nominal = source_char.is_some_and(|ch| {
                    info.glyph_id == 0
                        || charmap.map(ch).map(|gid| gid.to_u32()) == Some(info.glyph_id)
                });
                let glyph_name = source_char
                    .filter(|_| is_nominal)
                    .and_then(|ch| self.nominal_glyphs.glyph_name(ch))
                    .map(str::to_string)
                    .unwrap_or_else(|| self.binary_glyph_name(info.glyph_id));

                let mut x_advance = position.x_advance as f64;
                if let Some(editor_advance) = advances.get(&glyph_name) {
                    let font_advance = metrics
                        .advance_width(GlyphId::new(info.glyph_id))
                        .unwrap_or_default() as f64;
                    x_advance += editor_advance - font_advance;
                }

                let mut flags = GlyphFlags::empty();
                if info.unsafe_to_break() {
                    flags |= GlyphFlags::UNSAFE_TO_BREAK;
                }

                ShapedGlyph {
                    cluster,
                    glyph_name,
                    glyph_id: Some(info.glyph_id),
                    x_advance,
                    y_advance: position.y_advance as f64,
                    x_offset: position.x_offset as f64,
                    y_offset: position.y_offset as f64,
                    is_mark: source_char.is_some_and(is_mark_character),
                    flags,
                }
            })
            .collect()
    }

    fn feature_tags(&self, table_tag: &str) -> BTreeSet<String> {
        let Ok(font) = skrifa::FontRef::from_index(&self.font_data, 0) else {
            return BTreeSet::new();
        };
        let feature_list = match table_tag {
            "GSUB" => font.gsub().and_then(|gsub| gsub.feature_list()),
            "GPOS" => font.gpos().and_then(|gpos| gpos.feature_list()),
            _ => return BTreeSet::new(),
        };
        feature_list
            .map(|list| {
                list.feature_records()
                    .iter()
                    .map(|record| record.feature_tag().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn nominal_glyphs(&self) -> &NominalGlyphs {
        &self.nominal_glyphs
    }

    fn nominal_glyphs_mut(&mut self) -> &mut NominalGlyphs {
        &mut self.nominal_glyphs
    }

    fn close(self: Box<Self>) {
        debug!("Closing shaper for {} byte font", self.font_data.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaping::DISABLE_KERN_FEATURE;

    #[test]
    fn test_byte_to_char_indices() {
        assert_eq!(byte_to_char_indices("aÄb"), vec![0, 1, 1, 2, 3]);
        assert_eq!(byte_to_char_indices(""), vec![0]);
    }

    #[test]
    fn test_invalid_binary_is_rejected() {
        let data: Arc<[u8]> = Arc::from(vec![0u8; 12]);
        assert!(HarfRustShaper::new(data, CharacterMap::new()).is_err());
    }

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    /// A shaper over an installed system font, `None` where it is missing
    fn system_shaper(character_map: CharacterMap) -> Option<HarfRustShaper> {
        let Ok(data) = std::fs::read(SYSTEM_FONT) else {
            eprintln!("{SYSTEM_FONT} not installed, skipping");
            return None;
        };
        Some(HarfRustShaper::new(Arc::from(data), character_map).unwrap())
    }

    fn no_kern() -> ShapeOptions {
        ShapeOptions {
            features: vec![DISABLE_KERN_FEATURE.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_editor_mapping_names_nominal_glyphs() {
        let character_map: CharacterMap = [('A', "B".to_string())].into_iter().collect();
        let Some(shaper) = system_shaper(character_map) else {
            return;
        };
        let shaped = shaper.shape("AV", &GlyphAdvances::new(), &no_kern());
        let names: Vec<&str> = shaped.iter().map(|glyph| glyph.glyph_name.as_str()).collect();
        assert_eq!(names, vec!["B", "V"]);
        assert!(shaped.iter().all(|glyph| glyph.glyph_id.is_some()));
    }

    #[test]
    fn test_editor_advances_replace_font_advances() {
        let character_map: CharacterMap = [('A', "B".to_string())].into_iter().collect();
        let Some(shaper) = system_shaper(character_map) else {
            return;
        };
        let advances: GlyphAdvances = [("B".to_string(), 777.0)].into_iter().collect();

        let shaped = shaper.shape("AV", &advances, &no_kern());
        assert_eq!(shaped[0].x_advance, 777.0);

        // Font kerning stays on unless switched off
        let shaped = shaper.shape("AV", &advances, &ShapeOptions::default());
        assert!(shaped[0].x_advance < 777.0);
    }

    #[test]
    fn test_private_use_references_reach_the_editor_glyph() {
        let Some(mut shaper) = system_shaper(CharacterMap::new()) else {
            return;
        };
        let ch = shaper.pua_character("A.alt");
        let shaped = shaper.shape(&ch.to_string(), &GlyphAdvances::new(), &no_kern());
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].glyph_name, "A.alt");
        assert_eq!(shaped[0].cluster, 0);
    }

    #[test]
    fn test_ligature_and_right_to_left_clusters() {
        let Some(shaper) = system_shaper(CharacterMap::new()) else {
            return;
        };
        let ligature = shaper.shape("fi", &GlyphAdvances::new(), &ShapeOptions::default());
        assert_eq!(ligature.len(), 1);
        assert_eq!(ligature[0].cluster, 0);
        assert_ne!(ligature[0].glyph_name, "f");

        let hebrew = shaper.shape("\u{5D0}\u{5D1}", &GlyphAdvances::new(), &ShapeOptions::default());
        let clusters: Vec<usize> = hebrew.iter().map(|glyph| glyph.cluster).collect();
        assert_eq!(clusters, vec![1, 0]);
    }

    #[test]
    fn test_feature_tags() {
        let Some(shaper) = system_shaper(CharacterMap::new()) else {
            return;
        };
        assert!(shaper.feature_tags("GSUB").contains("liga"));
        assert!(shaper.feature_tags("GPOS").contains("kern"));
        assert!(shaper.feature_tags("kern").is_empty());
    }
}
