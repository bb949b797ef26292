//! Character line parser tests

use super::*;

fn test_font_maps() -> (CharacterMap, GlyphMap) {
    let mut glyph_map: GlyphMap = " /AÄBCQ"
        .chars()
        .map(|ch| (suggested_glyph_name(ch), vec![ch]))
        .collect();
    glyph_map.insert("A.alt".to_string(), vec![]);
    glyph_map.insert("Adieresis.alt".to_string(), vec![]);
    let character_map = character_map_from_glyph_map(&glyph_map);
    (character_map, glyph_map)
}

fn parse(text: &str) -> CharacterLine {
    let (character_map, glyph_map) = test_font_maps();
    parse_line(text, &character_map, &glyph_map, Some("Q"))
}

fn entry(character: Option<char>, glyph_name: &str) -> GlyphRef {
    GlyphRef {
        character,
        glyph_name: Some(glyph_name.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_plain_characters() {
    assert_eq!(
        parse("AÄBC"),
        vec![
            entry(Some('A'), "A"),
            entry(Some('Ä'), "Adieresis"),
            entry(Some('B'), "B"),
            entry(Some('C'), "C"),
        ]
    );
}

#[test]
fn test_glyph_name_tokens() {
    assert_eq!(parse("/A.alt"), vec![entry(None, "A.alt")]);
    assert_eq!(parse("/A.alt/"), vec![entry(None, "A.alt")]);
    assert_eq!(parse("/"), vec![]);
    assert_eq!(parse("/Ä"), vec![entry(Some('Ä'), "Adieresis")]);
    assert_eq!(parse("/Ä.alt"), vec![entry(None, "Adieresis.alt")]);
}

#[test]
fn test_mixed_line_with_missing_glyph() {
    let mut missing = entry(None, "B.alt");
    missing.is_undefined = true;
    assert_eq!(
        parse("A/A.alt/B.alt C //"),
        vec![
            entry(Some('A'), "A"),
            entry(None, "A.alt"),
            missing,
            entry(Some('C'), "C"),
            entry(Some(' '), "space"),
            entry(Some('/'), "slash"),
        ]
    );
}

#[test]
fn test_placeholder() {
    let mut placeholder = entry(Some('Q'), "Q");
    placeholder.is_placeholder = true;
    assert_eq!(
        parse("A/?C"),
        vec![entry(Some('A'), "A"), placeholder, entry(Some('C'), "C")]
    );
}

#[test]
fn test_placeholder_default_name() {
    let (character_map, glyph_map) = test_font_maps();
    let line = parse_line("/?", &character_map, &glyph_map, None);
    assert_eq!(line.len(), 1);
    assert_eq!(line[0].glyph_name.as_deref(), Some(DEFAULT_PLACEHOLDER_GLYPH));
    assert!(line[0].is_placeholder);
    assert!(line[0].is_undefined);
    assert_eq!(line[0].character, None);
}

#[test]
fn test_unmapped_characters_are_undefined() {
    let line = parse("Z😻");
    assert_eq!(line.len(), 2);
    assert_eq!(line[0].glyph_name.as_deref(), Some("Z"));
    assert!(line[0].is_undefined);
    assert_eq!(line[1].glyph_name.as_deref(), Some("u1F63B"));
    assert_eq!(line[1].character, Some('😻'));
    assert!(line[1].is_undefined);
}

#[test]
fn test_code_point_recovered_from_unknown_name() {
    let line = parse("/uni0627");
    assert_eq!(line.len(), 1);
    assert_eq!(line[0].character, Some('\u{0627}'));
    assert!(line[0].is_undefined);
}

#[test]
fn test_multiple_lines() {
    let (character_map, glyph_map) = test_font_maps();
    let lines = character_lines_from_string("AB\r\nC\n", &character_map, &glyph_map, None);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].len(), 2);
    assert_eq!(lines[1].len(), 1);
    assert!(lines[2].is_empty());
}

#[test]
fn test_stringify() {
    let placeholder = GlyphRef {
        character: Some('A'),
        is_placeholder: true,
        ..Default::default()
    };
    let cases: Vec<(CharacterLine, &str)> = vec![
        (vec![GlyphRef::from_character('A')], "A"),
        (vec![GlyphRef::from_character('/')], "//"),
        (vec![GlyphRef::from_glyph_name("A")], "/A"),
        (
            vec![GlyphRef::from_glyph_name("A"), GlyphRef::from_glyph_name("A")],
            "/A/A",
        ),
        (
            vec![GlyphRef::from_glyph_name("A"), GlyphRef::from_character('A')],
            "/A A",
        ),
        (
            vec![GlyphRef::from_character('A'), GlyphRef::from_glyph_name("A")],
            "A/A",
        ),
        (
            vec![placeholder.clone(), GlyphRef::from_character('A')],
            "/?A",
        ),
        (vec![placeholder, GlyphRef::from_glyph_name("A")], "/?/A"),
    ];
    for (line, expected) in cases {
        assert_eq!(string_from_character_line(&line), expected);
    }
}

#[test]
fn test_round_trip() {
    for text in ["AB C", "A/A.alt/B.alt C //", "/A.alt/Adieresis.alt", "A/?C", "ÄB//"] {
        let line = parse(text);
        let serialized = string_from_character_line(&line);
        assert_eq!(serialized, text);
        assert_eq!(parse(&serialized), line);
    }
}

#[test]
fn test_remap_after_character_map_change() {
    let (mut character_map, mut glyph_map) = test_font_maps();
    let line = parse_line("AZ", &character_map, &glyph_map, None);
    assert!(line[1].is_undefined);

    glyph_map.insert("Z.ss01".to_string(), vec!['Z']);
    character_map.insert('Z', "Z.ss01".to_string());
    character_map.remove(&'A');

    let remapped = remap_character_line(&line, &character_map, &glyph_map);
    assert_eq!(remapped[0].glyph_name.as_deref(), Some("A"));
    assert!(!remapped[0].is_undefined);
    assert_eq!(remapped[1].glyph_name.as_deref(), Some("Z.ss01"));
    assert!(!remapped[1].is_undefined);
}
