//! Glyph naming helpers
//!
//! Maps characters to the production glyph names a font editor suggests for
//! them, and recovers code points from glyph names typed by the user.

use std::collections::HashMap;
use std::sync::OnceLock;

const DIGIT_NAMES: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Names for ASCII punctuation and the Latin-1 / common Latin range.
/// Letters and digits are generated, see [`name_table`].
const NAMED_CHARACTERS: &[(char, &str)] = &[
    (' ', "space"),
    ('!', "exclam"),
    ('"', "quotedbl"),
    ('#', "numbersign"),
    ('$', "dollar"),
    ('%', "percent"),
    ('&', "ampersand"),
    ('\'', "quotesingle"),
    ('(', "parenleft"),
    (')', "parenright"),
    ('*', "asterisk"),
    ('+', "plus"),
    (',', "comma"),
    ('-', "hyphen"),
    ('.', "period"),
    ('/', "slash"),
    (':', "colon"),
    (';', "semicolon"),
    ('<', "less"),
    ('=', "equal"),
    ('>', "greater"),
    ('?', "question"),
    ('@', "at"),
    ('[', "bracketleft"),
    ('\\', "backslash"),
    (']', "bracketright"),
    ('^', "asciicircum"),
    ('_', "underscore"),
    ('`', "grave"),
    ('{', "braceleft"),
    ('|', "bar"),
    ('}', "braceright"),
    ('~', "asciitilde"),
    ('\u{A1}', "exclamdown"),
    ('\u{A2}', "cent"),
    ('\u{A3}', "sterling"),
    ('\u{A4}', "currency"),
    ('\u{A5}', "yen"),
    ('\u{A6}', "brokenbar"),
    ('\u{A7}', "section"),
    ('\u{A8}', "dieresis"),
    ('\u{A9}', "copyright"),
    ('\u{AA}', "ordfeminine"),
    ('\u{AB}', "guillemotleft"),
    ('\u{AC}', "logicalnot"),
    ('\u{AE}', "registered"),
    ('\u{AF}', "macron"),
    ('\u{B0}', "degree"),
    ('\u{B1}', "plusminus"),
    ('\u{B2}', "twosuperior"),
    ('\u{B3}', "threesuperior"),
    ('\u{B4}', "acute"),
    ('\u{B5}', "mu"),
    ('\u{B6}', "paragraph"),
    ('\u{B7}', "periodcentered"),
    ('\u{B8}', "cedilla"),
    ('\u{B9}', "onesuperior"),
    ('\u{BA}', "ordmasculine"),
    ('\u{BB}', "guillemotright"),
    ('\u{BC}', "onequarter"),
    ('\u{BD}', "onehalf"),
    ('\u{BE}', "threequarters"),
    ('\u{BF}', "questiondown"),
    ('\u{C0}', "Agrave"),
    ('\u{C1}', "Aacute"),
    ('\u{C2}', "Acircumflex"),
    ('\u{C3}', "Atilde"),
    ('\u{C4}', "Adieresis"),
    ('\u{C5}', "Aring"),
    ('\u{C6}', "AE"),
    ('\u{C7}', "Ccedilla"),
    ('\u{C8}', "Egrave"),
    ('\u{C9}', "Eacute"),
    ('\u{CA}', "Ecircumflex"),
    ('\u{CB}', "Edieresis"),
    ('\u{CC}', "Igrave"),
    ('\u{CD}', "Iacute"),
    ('\u{CE}', "Icircumflex"),
    ('\u{CF}', "Idieresis"),
    ('\u{D0}', "Eth"),
    ('\u{D1}', "Ntilde"),
    ('\u{D2}', "Ograve"),
    ('\u{D3}', "Oacute"),
    ('\u{D4}', "Ocircumflex"),
    ('\u{D5}', "Otilde"),
    ('\u{D6}', "Odieresis"),
    ('\u{D7}', "multiply"),
    ('\u{D8}', "Oslash"),
    ('\u{D9}', "Ugrave"),
    ('\u{DA}', "Uacute"),
    ('\u{DB}', "Ucircumflex"),
    ('\u{DC}', "Udieresis"),
    ('\u{DD}', "Yacute"),
    ('\u{DE}', "Thorn"),
    ('\u{DF}', "germandbls"),
    ('\u{E0}', "agrave"),
    ('\u{E1}', "aacute"),
    ('\u{E2}', "acircumflex"),
    ('\u{E3}', "atilde"),
    ('\u{E4}', "adieresis"),
    ('\u{E5}', "aring"),
    ('\u{E6}', "ae"),
    ('\u{E7}', "ccedilla"),
    ('\u{E8}', "egrave"),
    ('\u{E9}', "eacute"),
    ('\u{EA}', "ecircumflex"),
    ('\u{EB}', "edieresis"),
    ('\u{EC}', "igrave"),
    ('\u{ED}', "iacute"),
    ('\u{EE}', "icircumflex"),
    ('\u{EF}', "idieresis"),
    ('\u{F0}', "eth"),
    ('\u{F1}', "ntilde"),
    ('\u{F2}', "ograve"),
    ('\u{F3}', "oacute"),
    ('\u{F4}', "ocircumflex"),
    ('\u{F5}', "otilde"),
    ('\u{F6}', "odieresis"),
    ('\u{F7}', "divide"),
    ('\u{F8}', "oslash"),
    ('\u{F9}', "ugrave"),
    ('\u{FA}', "uacute"),
    ('\u{FB}', "ucircumflex"),
    ('\u{FC}', "udieresis"),
    ('\u{FD}', "yacute"),
    ('\u{FE}', "thorn"),
    ('\u{FF}', "ydieresis"),
    ('\u{131}', "dotlessi"),
    ('\u{152}', "OE"),
    ('\u{153}', "oe"),
    ('\u{160}', "Scaron"),
    ('\u{161}', "scaron"),
    ('\u{178}', "Ydieresis"),
    ('\u{17D}', "Zcaron"),
    ('\u{17E}', "zcaron"),
    ('\u{2013}', "endash"),
    ('\u{2014}', "emdash"),
    ('\u{2018}', "quoteleft"),
    ('\u{2019}', "quoteright"),
    ('\u{201C}', "quotedblleft"),
    ('\u{201D}', "quotedblright"),
    ('\u{2022}', "bullet"),
    ('\u{2026}', "ellipsis"),
    ('\u{20AC}', "Euro"),
    ('\u{2122}', "trademark"),
];

struct NameTable {
    by_char: HashMap<char, String>,
    by_name: HashMap<String, char>,
}

fn name_table() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut by_char = HashMap::new();
        for ch in ('A'..='Z').chain('a'..='z') {
            by_char.insert(ch, ch.to_string());
        }
        for (digit, name) in ('0'..='9').zip(DIGIT_NAMES) {
            by_char.insert(digit, name.to_string());
        }
        for (ch, name) in NAMED_CHARACTERS {
            by_char.insert(*ch, name.to_string());
        }
        let by_name = by_char
            .iter()
            .map(|(ch, name)| (name.clone(), *ch))
            .collect();
        NameTable { by_char, by_name }
    })
}

/// Suggest a glyph name for a character.
///
/// Known characters get their production name, everything else falls back
/// to `uniXXXX` (BMP) or `uXXXXX` (supplementary planes).
pub fn suggested_glyph_name(ch: char) -> String {
    if let Some(name) = name_table().by_char.get(&ch) {
        return name.clone();
    }
    let code = ch as u32;
    if code <= 0xFFFF {
        format!("uni{code:04X}")
    } else {
        format!("u{code:X}")
    }
}

/// Recover the character a glyph name stands for, if any.
///
/// The name must be a known production name or a `uniXXXX` / `uXXXX`
/// style name. Names with an extension (`A.alt`) do not resolve.
pub fn code_point_from_glyph_name(glyph_name: &str) -> Option<char> {
    if let Some(ch) = name_table().by_name.get(glyph_name) {
        return Some(*ch);
    }
    if let Some(hex) = glyph_name.strip_prefix("uni") {
        if hex.len() == 4 {
            return parse_hex_char(hex);
        }
        return None;
    }
    if let Some(hex) = glyph_name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            return parse_hex_char(hex);
        }
    }
    None
}

fn parse_hex_char(hex: &str) -> Option<char> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Split a glyph name into its base and extension.
///
/// The extension starts at the first period after the first character and
/// keeps the period, so `"A.alt"` gives `("A", ".alt")` and `".notdef"`
/// has no extension.
pub fn split_glyph_name_extension(glyph_name: &str) -> (&str, &str) {
    let mut chars = glyph_name.char_indices();
    chars.next();
    match chars.find(|(_, c)| *c == '.') {
        Some((index, _)) => glyph_name.split_at(index),
        None => (glyph_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_glyph_names() {
        assert_eq!(suggested_glyph_name('A'), "A");
        assert_eq!(suggested_glyph_name('7'), "seven");
        assert_eq!(suggested_glyph_name(' '), "space");
        assert_eq!(suggested_glyph_name('/'), "slash");
        assert_eq!(suggested_glyph_name('Ä'), "Adieresis");
        assert_eq!(suggested_glyph_name('\u{0627}'), "uni0627");
        assert_eq!(suggested_glyph_name('😻'), "u1F63B");
    }

    #[test]
    fn test_code_point_from_glyph_name() {
        assert_eq!(code_point_from_glyph_name("Adieresis"), Some('Ä'));
        assert_eq!(code_point_from_glyph_name("uni0627"), Some('\u{0627}'));
        assert_eq!(code_point_from_glyph_name("u1F63B"), Some('😻'));
        assert_eq!(code_point_from_glyph_name("uni06"), None);
        assert_eq!(code_point_from_glyph_name("uni0627.fina"), None);
        assert_eq!(code_point_from_glyph_name("B.alt"), None);
        assert_eq!(code_point_from_glyph_name("u"), None);
    }

    #[test]
    fn test_split_glyph_name_extension() {
        assert_eq!(split_glyph_name_extension("A.alt"), ("A", ".alt"));
        assert_eq!(split_glyph_name_extension("A.alt.ss01"), ("A", ".alt.ss01"));
        assert_eq!(split_glyph_name_extension(".notdef"), (".notdef", ""));
        assert_eq!(split_glyph_name_extension("Ä.alt"), ("Ä", ".alt"));
        assert_eq!(split_glyph_name_extension("space"), ("space", ""));
    }
}
