//! Parsing typed text into character lines
//!
//! A slash introduces a glyph name, so users can type glyphs that have no
//! character (`/A.alt`), escape a slash (`//`) or drop in the placeholder
//! glyph (`/?`). Parsing never fails: malformed input is read as well as it
//! can be.

use super::glyph_data::{code_point_from_glyph_name, split_glyph_name_extension, suggested_glyph_name};
use super::{CharacterMap, GlyphMap};
use serde::{Deserialize, Serialize};

/// Glyph name used for `/?` when no placeholder is configured
pub const DEFAULT_PLACEHOLDER_GLYPH: &str = "--placeholder--";

/// One entry of a character line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRef {
    /// The character this entry was typed as, if any
    pub character: Option<char>,
    /// The glyph this entry resolves to
    pub glyph_name: Option<String>,
    /// The glyph name is not part of the font
    pub is_undefined: bool,
    /// Inserted with `/?`
    pub is_placeholder: bool,
}

impl GlyphRef {
    pub fn from_character(character: char) -> Self {
        Self {
            character: Some(character),
            ..Default::default()
        }
    }

    pub fn from_glyph_name(glyph_name: impl Into<String>) -> Self {
        Self {
            glyph_name: Some(glyph_name.into()),
            ..Default::default()
        }
    }
}

pub type CharacterLine = Vec<GlyphRef>;

/// Parse multi-line text, one character line per `\n` or `\r\n` separated line.
pub fn character_lines_from_string(
    text: &str,
    character_map: &CharacterMap,
    glyph_map: &GlyphMap,
    placeholder_glyph_name: Option<&str>,
) -> Vec<CharacterLine> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| parse_line(line, character_map, glyph_map, placeholder_glyph_name))
        .collect()
}

/// Parse a single line of text into glyph references.
pub fn parse_line(
    text: &str,
    character_map: &CharacterMap,
    glyph_map: &GlyphMap,
    placeholder_glyph_name: Option<&str>,
) -> CharacterLine {
    let chars: Vec<char> = text.chars().collect();
    let mut line = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        let mut character = Some(chars[i]);
        let mut glyph_name: Option<String>;
        let mut is_placeholder = false;

        if chars[i] == '/' {
            i += 1;
            match chars.get(i) {
                Some('/') => {
                    glyph_name = character_map.get(&'/').cloned();
                }
                Some('?') => {
                    let name = placeholder_glyph_name
                        .unwrap_or(DEFAULT_PLACEHOLDER_GLYPH)
                        .to_string();
                    character = char_from_glyph_name(&name, character_map, glyph_map);
                    glyph_name = Some(name);
                    is_placeholder = true;
                }
                _ => {
                    let end = chars[i..]
                        .iter()
                        .position(|c| *c == '/' || c.is_whitespace())
                        .map_or(chars.len(), |offset| i + offset);
                    let name: String = chars[i..end].iter().collect();
                    // Leave a following slash to start the next token, swallow whitespace
                    i = if chars.get(end) == Some(&'/') { end - 1 } else { end };

                    let (resolved_name, resolved_character) =
                        resolve_glyph_name_token(name, character_map, glyph_map);
                    glyph_name = Some(resolved_name);
                    character = resolved_character;
                }
            }
        } else {
            glyph_name = character_map.get(&chars[i]).cloned();
        }
        i += 1;

        if glyph_name.as_deref() == Some("") {
            continue;
        }

        let is_undefined = match (&glyph_name, character) {
            (None, Some(ch)) => {
                glyph_name = Some(suggested_glyph_name(ch));
                true
            }
            (Some(name), _) => !glyph_map.contains_key(name),
            (None, None) => continue,
        };

        line.push(GlyphRef {
            character,
            glyph_name,
            is_undefined,
            is_placeholder,
        });
    }

    line
}

/// Resolve a typed glyph name to the glyph it means and the character it shows.
fn resolve_glyph_name_token(
    mut glyph_name: String,
    character_map: &CharacterMap,
    glyph_map: &GlyphMap,
) -> (String, Option<char>) {
    let mut character = char_from_glyph_name(&glyph_name, character_map, glyph_map);
    if glyph_name.is_empty() || character.is_some() || glyph_map.contains_key(&glyph_name) {
        return (glyph_name, character);
    }

    let (base, extension) = split_glyph_name_extension(&glyph_name);
    let mut base_chars = base.chars();
    match (base_chars.next(), base_chars.next()) {
        (Some(base_char), None) if !base_char.is_ascii_alphabetic() => {
            // `/Å.alt` is shorthand for `/Aring.alt`
            let proper_base = character_map
                .get(&base_char)
                .cloned()
                .unwrap_or_else(|| suggested_glyph_name(base_char));
            if extension.is_empty() {
                character = Some(base_char);
            }
            glyph_name = format!("{proper_base}{extension}");
        }
        _ => {
            character = code_point_from_glyph_name(&glyph_name);
        }
    }
    (glyph_name, character)
}

/// The character a glyph is the nominal glyph for, if any.
fn char_from_glyph_name(
    glyph_name: &str,
    character_map: &CharacterMap,
    glyph_map: &GlyphMap,
) -> Option<char> {
    glyph_map.get(glyph_name).and_then(|code_points| {
        code_points
            .iter()
            .copied()
            .find(|ch| character_map.get(ch).map(String::as_str) == Some(glyph_name))
    })
}

/// Serialize character lines back to editable text.
pub fn string_from_character_lines(lines: &[CharacterLine]) -> String {
    lines
        .iter()
        .map(|line| string_from_character_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn string_from_character_line(line: &[GlyphRef]) -> String {
    let mut text = String::new();
    for (index, glyph_ref) in line.iter().enumerate() {
        if glyph_ref.is_placeholder {
            text.push_str("/?");
        } else if glyph_ref.character == Some('/') {
            text.push_str("//");
        } else if let Some(ch) = glyph_ref.character {
            text.push(ch);
        } else {
            text.push('/');
            text.push_str(glyph_ref.glyph_name.as_deref().unwrap_or_default());
            // A following character would otherwise be read as part of the name
            if line.get(index + 1).is_some_and(|next| next.character.is_some()) {
                text.push(' ');
            }
        }
    }
    text
}

/// Re-resolve a character line against a changed character map.
///
/// Entries typed as characters pick up their new glyph name (or a suggested
/// one when the character is no longer mapped); glyph-name entries only get
/// their `is_undefined` flag refreshed.
pub fn remap_character_line(
    line: &[GlyphRef],
    character_map: &CharacterMap,
    glyph_map: &GlyphMap,
) -> CharacterLine {
    line.iter()
        .map(|glyph_ref| {
            let mut remapped = glyph_ref.clone();
            if let (Some(ch), false) = (glyph_ref.character, glyph_ref.is_placeholder) {
                remapped.glyph_name = Some(
                    character_map
                        .get(&ch)
                        .cloned()
                        .unwrap_or_else(|| suggested_glyph_name(ch)),
                );
            }
            remapped.is_undefined = remapped
                .glyph_name
                .as_ref()
                .is_none_or(|name| !glyph_map.contains_key(name));
            remapped
        })
        .collect()
}
