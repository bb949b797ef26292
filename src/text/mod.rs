//! Text entry: from typed strings to glyph references
//!
//! - `character_lines.rs`: the `/glyphname` aware line parser and its inverse
//! - `glyph_data.rs`: glyph name suggestions and code point recovery

pub mod character_lines;
pub mod glyph_data;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

/// Character to glyph name, the editor's view of the font's cmap
pub type CharacterMap = HashMap<char, String>;

/// Glyph name to the characters mapped to it
pub type GlyphMap = HashMap<String, Vec<char>>;

pub use character_lines::{
    character_lines_from_string, parse_line, remap_character_line, string_from_character_line,
    string_from_character_lines, CharacterLine, GlyphRef, DEFAULT_PLACEHOLDER_GLYPH,
};
pub use glyph_data::{code_point_from_glyph_name, split_glyph_name_extension, suggested_glyph_name};

/// Build the character map that is the inverse of a glyph map.
///
/// When several glyphs claim a character, the alphabetically first glyph
/// name wins so the result does not depend on hash order.
pub fn character_map_from_glyph_map(glyph_map: &GlyphMap) -> CharacterMap {
    let mut names: Vec<&String> = glyph_map.keys().collect();
    names.sort();
    let mut character_map = CharacterMap::new();
    for name in names.into_iter().rev() {
        for ch in &glyph_map[name] {
            character_map.insert(*ch, name.clone());
        }
    }
    character_map
}
