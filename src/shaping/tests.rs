//! Shaping tests

use super::*;
use std::collections::BTreeSet;

fn set(values: &[usize]) -> BTreeSet<usize> {
    values.iter().copied().collect()
}

fn test_character_map() -> CharacterMap {
    [('V', "V"), ('A', "A"), ('f', "f"), ('\u{0301}', "acutecomb")]
        .into_iter()
        .map(|(ch, name)| (ch, name.to_string()))
        .collect()
}

fn assert_symmetric(mapping: &ClusterMapping) {
    for (glyph, chars) in mapping.glyph_to_chars.iter().enumerate() {
        assert!(!chars.is_empty(), "glyph {glyph} maps to no character");
        for ch in chars {
            assert!(mapping.char_to_glyphs[*ch].contains(&glyph));
        }
    }
    for (ch, glyphs) in mapping.char_to_glyphs.iter().enumerate() {
        assert!(!glyphs.is_empty(), "character {ch} maps to no glyph");
        for glyph in glyphs {
            assert!(mapping.glyph_to_chars[*glyph].contains(&ch));
        }
    }
}

#[test]
fn test_cluster_mapping_decomposition() {
    let mapping = build_mapping(&[0, 0, 1], 2);
    assert_eq!(mapping.glyph_to_chars, vec![set(&[0]), set(&[0]), set(&[1])]);
    assert_eq!(mapping.char_to_glyphs, vec![set(&[0, 1]), set(&[2])]);
    assert_symmetric(&mapping);
}

#[test]
fn test_cluster_mapping_ligature() {
    // "ffi" as one ligature glyph followed by "x"
    let mapping = build_mapping(&[0, 3], 4);
    assert_eq!(mapping.glyph_to_chars, vec![set(&[0, 1, 2]), set(&[3])]);
    assert_eq!(mapping.char_to_glyphs[1], set(&[0]));
    assert_symmetric(&mapping);
}

#[test]
fn test_cluster_mapping_rtl() {
    let mapping = build_mapping(&[3, 2, 0], 4);
    assert_eq!(mapping.glyph_to_chars, vec![set(&[3]), set(&[2]), set(&[0, 1])]);
    assert_eq!(mapping.char_to_glyphs, vec![set(&[2]), set(&[2]), set(&[1]), set(&[0])]);
    assert_symmetric(&mapping);
}

#[test]
fn test_cluster_mapping_edges() {
    let empty = build_mapping(&[], 3);
    assert_eq!(empty.char_to_glyphs.len(), 3);
    assert!(empty.glyph_to_chars.is_empty());

    // Leading characters attach to the first cluster, stray values clamp
    let mapping = build_mapping(&[1, 9], 3);
    assert_eq!(mapping.glyph_to_chars, vec![set(&[0, 1]), set(&[2])]);
    assert_symmetric(&mapping);
    assert_eq!(mapping.glyphs_for_char(0).collect::<Vec<_>>(), vec![0]);
    assert_eq!(mapping.chars_for_glyph(5).count(), 0);
}

#[test]
fn test_fallback_shaping() {
    let shaper = FallbackShaper::new(test_character_map());
    let advances: GlyphAdvances = [("V".to_string(), 401.0)].into_iter().collect();
    let glyphs = shaper.shape("VA😻", &advances, &ShapeOptions::default());

    let names: Vec<&str> = glyphs.iter().map(|g| g.glyph_name.as_str()).collect();
    assert_eq!(names, vec!["V", "A", NOTDEF_GLYPH]);
    let clusters: Vec<usize> = glyphs.iter().map(|g| g.cluster).collect();
    assert_eq!(clusters, vec![0, 1, 2]);
    assert_eq!(glyphs[0].x_advance, 401.0);
    assert_eq!(glyphs[1].x_advance, DEFAULT_ADVANCE);
    assert!(glyphs.iter().all(|g| g.glyph_id.is_none() && g.flags.is_empty()));
}

#[test]
fn test_fallback_marks_and_feature_tags() {
    let shaper = FallbackShaper::new(test_character_map());
    let glyphs = shaper.shape("A\u{0301}", &GlyphAdvances::new(), &ShapeOptions::default());
    assert!(!glyphs[0].is_mark);
    assert!(glyphs[1].is_mark);
    assert!(shaper.feature_tags("GSUB").is_empty());
}

#[test]
fn test_fallback_is_strictly_left_to_right() {
    let shaper = FallbackShaper::new(CharacterMap::new());
    let glyphs = shaper.shape("\u{0627}\u{0628}", &GlyphAdvances::new(), &ShapeOptions::default());
    let clusters: Vec<usize> = glyphs.iter().map(|g| g.cluster).collect();
    assert_eq!(clusters, vec![0, 1]);
}

#[test]
fn test_glyph_names_through_private_use_characters() {
    let mut shaper = get_shaper(None, test_character_map()).unwrap();
    let alt = shaper.pua_character("A.alt");
    assert_eq!(alt, '\u{F0000}');
    assert_eq!(shaper.pua_character("B.alt"), '\u{F0001}');
    assert_eq!(shaper.pua_character("A.alt"), alt);
    assert_eq!(shaper.pua_glyph_name(alt), Some("A.alt"));

    let text: String = ['V', alt].iter().collect();
    let glyphs = shaper.shape(&text, &GlyphAdvances::new(), &ShapeOptions::default());
    assert_eq!(glyphs[1].glyph_name, "A.alt");
    shaper.close();
}

#[test]
fn test_set_character_map() {
    let mut shaper = FallbackShaper::new(CharacterMap::new());
    shaper.set_character_map(test_character_map());
    let glyphs = shaper.shape("f", &GlyphAdvances::new(), &ShapeOptions::default());
    assert_eq!(glyphs[0].glyph_name, "f");
}

#[test]
fn test_apply_kerning() {
    let shaper = FallbackShaper::new(test_character_map());
    let advances: GlyphAdvances = [("V".to_string(), 401.0), ("A".to_string(), 396.0)]
        .into_iter()
        .collect();
    let mut glyphs = shaper.shape("VAV", &advances, &ShapeOptions::default());
    apply_kerning(&mut glyphs, |left, right| match (left, right) {
        ("V", "A") => Some(-100.0),
        ("A", "V") => Some(0.0),
        _ => None,
    });

    assert_eq!(glyphs[0].x_advance, 301.0);
    assert_eq!(glyphs[1].x_advance, 396.0);
    assert!(!glyphs[0].flags.contains(GlyphFlags::KERNED));
    assert!(glyphs[1].flags.contains(GlyphFlags::KERNED));
    assert!(!glyphs[2].flags.contains(GlyphFlags::KERNED));
}
