//! Text shaping
//!
//! Two interchangeable shapers turn a run of characters into positioned
//! glyphs:
//! - [`HarfRustShaper`] runs the OpenType shaping engine over a compiled
//!   font binary
//! - [`FallbackShaper`] maps one character to one glyph, for fonts that have
//!   no binary yet
//!
//! Both resolve characters through the editor's own character map rather
//! than the font's cmap, and both feed glyph-name-only references through
//! private use characters. Kerning is applied afterwards by
//! [`apply_kerning`], independent of the shaper.

pub mod clusters;
pub mod fallback;
pub mod harfrust_shaper;

#[cfg(test)]
mod tests;

use crate::text::CharacterMap;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use clusters::{build_mapping, ClusterMapping};
pub use fallback::FallbackShaper;
pub use harfrust_shaper::HarfRustShaper;

/// Advance used when no metrics are known for a glyph
pub const DEFAULT_ADVANCE: f64 = 500.0;

/// Glyph name for characters the character map does not cover
pub const NOTDEF_GLYPH: &str = ".notdef";

/// First code point handed out for glyph-name-only references
const PUA_START: u32 = 0xF0000;
/// Last code point of Supplementary Private Use Area-A
const PUA_END: u32 = 0xFFFFD;

bitflags! {
    /// Per-glyph flags on a shaped glyph
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct GlyphFlags: u32 {
        /// A kerning value was added to the previous glyph's advance
        const KERNED = 1;
        /// The engine reports it is unsafe to break before this glyph
        const UNSAFE_TO_BREAK = 1 << 1;
    }
}

/// A glyph produced by a shaper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedGlyph {
    /// Index of the first character (not byte) of this glyph's cluster
    pub cluster: usize,
    pub glyph_name: String,
    /// Glyph id in the font binary, `None` for the fallback shaper
    pub glyph_id: Option<u32>,
    pub x_advance: f64,
    pub y_advance: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub is_mark: bool,
    pub flags: GlyphFlags,
}

/// Advance widths by glyph name, as far as the editor has loaded them
pub type GlyphAdvances = HashMap<String, f64>;

/// Feature setting that turns off kerning compiled into a font
pub const DISABLE_KERN_FEATURE: &str = "kern=0";

/// Per-call shaping options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeOptions {
    /// Variation coordinates by axis tag, in user space
    pub variations: BTreeMap<String, f64>,
    /// Feature settings in the usual `kern`, `-liga`, `ss01=1` syntax
    pub features: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ShaperError {
    #[error("failed to read font binary: {0}")]
    InvalidFont(String),
}

/// Character to glyph lookups shared by both shapers
///
/// Wraps the editor's character map and hands out private use characters
/// for glyphs that are referenced by name only, so they can travel through
/// a shaping engine that only understands text.
#[derive(Debug, Clone, Default)]
pub struct NominalGlyphs {
    character_map: CharacterMap,
    pua_characters: HashMap<String, char>,
    pua_glyph_names: HashMap<char, String>,
}

impl NominalGlyphs {
    pub fn new(character_map: CharacterMap) -> Self {
        Self {
            character_map,
            ..Default::default()
        }
    }

    pub fn set_character_map(&mut self, character_map: CharacterMap) {
        self.character_map = character_map;
    }

    pub fn character_map(&self) -> &CharacterMap {
        &self.character_map
    }

    /// The glyph a character stands for, private use characters included
    pub fn glyph_name(&self, ch: char) -> Option<&str> {
        self.character_map
            .get(&ch)
            .or_else(|| self.pua_glyph_names.get(&ch))
            .map(String::as_str)
    }

    /// The private use character standing in for a glyph name
    pub fn pua_character(&mut self, glyph_name: &str) -> char {
        if let Some(ch) = self.pua_characters.get(glyph_name) {
            return *ch;
        }
        let code = PUA_START + self.pua_characters.len() as u32;
        let Some(ch) = char::from_u32(code).filter(|_| code <= PUA_END) else {
            return char::REPLACEMENT_CHARACTER;
        };
        debug!("Assigned U+{:X} to glyph '{}'", code, glyph_name);
        self.pua_characters.insert(glyph_name.to_string(), ch);
        self.pua_glyph_names.insert(ch, glyph_name.to_string());
        ch
    }

    /// The glyph name a private use character was handed out for
    pub fn pua_glyph_name(&self, ch: char) -> Option<&str> {
        self.pua_glyph_names.get(&ch).map(String::as_str)
    }
}

/// A text shaper
pub trait Shaper {
    /// Shape a run of text into glyphs.
    fn shape(&self, text: &str, advances: &GlyphAdvances, options: &ShapeOptions) -> Vec<ShapedGlyph>;

    /// Feature tags present in a layout table (`"GSUB"` or `"GPOS"`).
    fn feature_tags(&self, table_tag: &str) -> BTreeSet<String>;

    fn nominal_glyphs(&self) -> &NominalGlyphs;

    fn nominal_glyphs_mut(&mut self) -> &mut NominalGlyphs;

    /// Release the shaper and everything it holds.
    fn close(self: Box<Self>);

    fn set_character_map(&mut self, character_map: CharacterMap) {
        self.nominal_glyphs_mut().set_character_map(character_map);
    }

    fn pua_character(&mut self, glyph_name: &str) -> char {
        self.nominal_glyphs_mut().pua_character(glyph_name)
    }

    fn pua_glyph_name(&self, ch: char) -> Option<&str> {
        self.nominal_glyphs().pua_glyph_name(ch)
    }
}

/// Pick a shaper for a font: the shaping engine when a compiled binary is
/// available, the fallback shaper otherwise.
pub fn get_shaper(
    font_binary: Option<Arc<[u8]>>,
    character_map: CharacterMap,
) -> Result<Box<dyn Shaper>, ShaperError> {
    match font_binary {
        Some(font_binary) => Ok(Box::new(HarfRustShaper::new(font_binary, character_map)?)),
        None => Ok(Box::new(FallbackShaper::new(character_map))),
    }
}

/// Apply pair kerning to a shaped run.
///
/// A non-zero value for a pair is added to the advance of the left glyph and
/// the right glyph is flagged [`GlyphFlags::KERNED`].
pub fn apply_kerning<F>(glyphs: &mut [ShapedGlyph], mut pair_value: F)
where
    F: FnMut(&str, &str) -> Option<f64>,
{
    for index in 1..glyphs.len() {
        let value = pair_value(&glyphs[index - 1].glyph_name, &glyphs[index].glyph_name)
            .unwrap_or_default();
        if value != 0.0 {
            glyphs[index - 1].x_advance += value;
            glyphs[index].flags |= GlyphFlags::KERNED;
        }
    }
}

/// Whether a character is a combining mark
pub(crate) fn is_mark_character(ch: char) -> bool {
    unicode_bidi::bidi_class(ch) == unicode_bidi::BidiClass::NSM
}
