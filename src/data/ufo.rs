//! Loading UFO sources
//!
//! Each UFO is one source of a (possibly variable) font. Glyph metrics are
//! collected per source, groups and kerning are merged into the default
//! kerning table: `public.kern1.*` groups become side 1 groups and
//! `public.kern2.*` groups side 2 groups.

use super::{FontData, GlyphMetrics, VariableGlyph, DEFAULT_UNITS_PER_EM};
use crate::kerning::{group_key, KernTable, KerningGroups, DEFAULT_KERN_TAG};
use crate::variation::{FontAxis, Location};
use anyhow::{bail, Context, Result};
use kurbo::Rect;
use norad::Font;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const KERN1_PREFIX: &str = "public.kern1.";
const KERN2_PREFIX: &str = "public.kern2.";

/// A UFO path and the design-space location it sits at
#[derive(Debug, Clone, PartialEq)]
pub struct UfoSource {
    pub path: PathBuf,
    pub location: Location,
}

impl FromStr for UfoSource {
    type Err = String;

    /// Parse `path.ufo@wght=400,wdth=100`; without `@` the location is empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, location) = match s.rsplit_once('@') {
            Some((path, location)) => (path, location),
            None => (s, ""),
        };
        let location = location
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| {
                let (axis, value) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("expected axis=value, got '{entry}'"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid value for axis '{axis}': '{value}'"))?;
                Ok((axis.trim().to_string(), value))
            })
            .collect::<Result<Location, String>>()?;
        Ok(Self {
            path: PathBuf::from(path),
            location,
        })
    }
}

/// Build font data from one or more UFO sources.
///
/// Sources are identified by their file stem. Glyph map and units per em
/// come from the sources in order, the first definition wins.
pub fn load_ufo_sources(sources: &[UfoSource], axes: Vec<FontAxis>) -> Result<FontData> {
    if sources.is_empty() {
        bail!("at least one UFO source is needed");
    }

    let mut data = FontData {
        units_per_em: DEFAULT_UNITS_PER_EM,
        axes,
        ..Default::default()
    };
    let mut table = KernTable::default();

    for (index, source) in sources.iter().enumerate() {
        let font = Font::load(&source.path)
            .with_context(|| format!("failed to load UFO {}", source.path.display()))?;
        let identifier = source_identifier(&source.path, &table.source_identifiers);

        if index == 0 {
            if let Some(units_per_em) = &font.font_info.units_per_em {
                data.units_per_em = **units_per_em;
            }
        }

        for glyph in font.default_layer().iter() {
            let name = glyph.name().to_string();
            let variable_glyph = data
                .glyphs
                .entry(name.clone())
                .or_insert_with(|| VariableGlyph {
                    name: name.clone(),
                    ..Default::default()
                });
            variable_glyph.sources.insert(
                identifier.clone(),
                GlyphMetrics {
                    x_advance: glyph.width,
                    bounds: contour_bounds(&glyph.contours),
                },
            );
            let code_points = data.glyph_map.entry(name).or_default();
            for ch in glyph.codepoints.iter() {
                if !code_points.contains(&ch) {
                    code_points.push(ch);
                }
            }
        }

        for (group, members) in &font.groups {
            let group = group.to_string();
            let members: Vec<String> = members.iter().map(|name| name.to_string()).collect();
            if let Some(name) = group.strip_prefix(KERN1_PREFIX) {
                insert_group(&mut table.groups_side1, name, members);
            } else if let Some(name) = group.strip_prefix(KERN2_PREFIX) {
                insert_group(&mut table.groups_side2, name, members);
            }
        }

        let source_index = table.source_identifiers.len();
        table.source_identifiers.push(identifier.clone());
        for (first, seconds) in &font.kerning {
            let left = kerning_key(&first.to_string(), KERN1_PREFIX);
            for (second, value) in seconds {
                let right = kerning_key(&second.to_string(), KERN2_PREFIX);
                table.set_value(&left, &right, source_index, Some(*value));
            }
        }

        data.sources.insert(identifier.clone(), source.location.clone());
        debug!(
            "Loaded source '{}' from {} ({} kerning rows)",
            identifier,
            source.path.display(),
            font.kerning.len()
        );
    }

    if table.pair_count() > 0 || !table.groups_side1.is_empty() || !table.groups_side2.is_empty() {
        data.kerning.insert(DEFAULT_KERN_TAG.to_string(), table);
    }
    info!(
        "Loaded {} sources with {} glyphs",
        data.sources.len(),
        data.glyphs.len()
    );
    Ok(data)
}

/// File stem of a source, made unique among the identifiers so far
fn source_identifier(path: &Path, existing: &[String]) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source".to_string());
    let mut identifier = stem.clone();
    let mut counter = 2;
    while existing.contains(&identifier) {
        identifier = format!("{stem}-{counter}");
        counter += 1;
    }
    identifier
}

fn insert_group(groups: &mut KerningGroups, name: &str, members: Vec<String>) {
    groups.entry(name.to_string()).or_insert(members);
}

/// Kerning pair key for a UFO kerning entry: groups get the group prefix.
fn kerning_key(name: &str, group_prefix: &str) -> String {
    match name.strip_prefix(group_prefix) {
        Some(group_name) => group_key(group_name),
        None => name.to_string(),
    }
}

fn contour_bounds(contours: &[norad::Contour]) -> Option<Rect> {
    contours
        .iter()
        .flat_map(|contour| contour.points.iter())
        .map(|point| Rect::new(point.x, point.y, point.x, point.y))
        .reduce(|bounds, point| bounds.union(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn square(size: f64) -> norad::Contour {
        let points = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)]
            .into_iter()
            .map(|(x, y)| norad::ContourPoint::new(x, y, norad::PointType::Line, false, None, None))
            .collect();
        norad::Contour::new(points, None)
    }

    fn write_ufo(path: &Path, advance: f64, kern: f64) {
        let mut font = Font::new();
        font.font_info.units_per_em = norad::fontinfo::NonNegativeIntegerOrFloat::new(2048.0);

        let mut glyph = norad::Glyph::new("T");
        glyph.width = advance;
        glyph.codepoints.insert('T');
        glyph.contours.push(square(advance));
        font.default_layer_mut().insert_glyph(glyph);

        let mut glyph = norad::Glyph::new("o");
        glyph.width = 500.0;
        glyph.codepoints.insert('o');
        font.default_layer_mut().insert_glyph(glyph);

        font.groups.insert(
            "public.kern1.T".parse().unwrap(),
            vec!["T".parse().unwrap()],
        );
        font.groups.insert(
            "public.kern2.o".parse().unwrap(),
            vec!["o".parse().unwrap()],
        );
        let mut seconds = BTreeMap::new();
        seconds.insert("public.kern2.o".parse().unwrap(), kern);
        font.kerning.insert("public.kern1.T".parse().unwrap(), seconds);

        font.save(path).unwrap();
    }

    #[test]
    fn test_parse_source_argument() {
        let source: UfoSource = "fonts/Bold.ufo@wght=700, wdth=100".parse().unwrap();
        assert_eq!(source.path, PathBuf::from("fonts/Bold.ufo"));
        assert_eq!(source.location.get("wght"), Some(&700.0));
        assert_eq!(source.location.get("wdth"), Some(&100.0));

        let source: UfoSource = "Regular.ufo".parse().unwrap();
        assert!(source.location.is_empty());
        assert!("Bold.ufo@wght".parse::<UfoSource>().is_err());
        assert!("Bold.ufo@wght=heavy".parse::<UfoSource>().is_err());
    }

    #[test]
    fn test_load_sources() {
        let dir = tempfile::tempdir().unwrap();
        let regular = dir.path().join("Regular.ufo");
        let bold = dir.path().join("Bold.ufo");
        write_ufo(&regular, 600.0, -40.0);
        write_ufo(&bold, 700.0, -80.0);

        let sources = vec![
            UfoSource {
                path: regular,
                location: [("wght".to_string(), 400.0)].into_iter().collect(),
            },
            UfoSource {
                path: bold,
                location: [("wght".to_string(), 700.0)].into_iter().collect(),
            },
        ];
        let axes = vec![FontAxis::continuous("wght", "wght", 400.0, 400.0, 700.0)];
        let data = load_ufo_sources(&sources, axes).unwrap();

        assert_eq!(data.units_per_em, 2048.0);
        assert_eq!(data.glyph_map.get("T"), Some(&vec!['T']));
        assert_eq!(
            data.glyphs["T"].sources["Regular"].bounds,
            Some(Rect::new(0.0, 0.0, 600.0, 600.0))
        );
        assert_eq!(data.glyphs["o"].sources["Bold"].bounds, None);

        let table = &data.kerning[DEFAULT_KERN_TAG];
        assert_eq!(table.source_identifiers, vec!["Regular", "Bold"]);
        assert_eq!(table.groups_side1.get("T"), Some(&vec!["T".to_string()]));
        assert_eq!(
            table.pair_values("@T", "@o"),
            Some(&vec![Some(-40.0), Some(-80.0)])
        );

        let model = data.kerning_model(DEFAULT_KERN_TAG);
        let at = |weight: f64| {
            let location = [("wght".to_string(), weight)].into_iter().collect();
            model.pair_value("T", "o", &location, None).value()
        };
        assert_eq!(at(400.0), Some(-40.0));
        assert_eq!(at(550.0), Some(-60.0));
        assert_eq!(at(700.0), Some(-80.0));
    }

    #[test]
    fn test_missing_source_is_an_error() {
        assert!(load_ufo_sources(&[], Vec::new()).is_err());
        let source: UfoSource = "/nonexistent/Missing.ufo".parse().unwrap();
        assert!(load_ufo_sources(&[source], Vec::new()).is_err());
    }
}
