//! Font data as the layout and kerning code see it
//!
//! - `store.rs`: the shared store, change bus and glyph provider
//! - `ufo.rs`: loading UFO sources with norad

pub mod store;
pub mod ufo;

pub use store::FontStore;
pub use ufo::{load_ufo_sources, UfoSource};

use crate::kerning::{KernTable, KerningModel};
use crate::layout::GlyphInstance;
use crate::shaping::{get_shaper, Shaper, ShaperError};
use crate::text::{character_map_from_glyph_map, CharacterMap, GlyphMap};
use crate::variation::{DiscreteVariationModel, FontAxis, Location, VariationModel};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

pub const DEFAULT_UNITS_PER_EM: f64 = 1000.0;

/// Metrics of a glyph in one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphMetrics {
    pub x_advance: f64,
    pub bounds: Option<Rect>,
}

/// A glyph with metrics for the sources that define it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableGlyph {
    pub name: String,
    /// Source identifier to metrics
    pub sources: BTreeMap<String, GlyphMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontData {
    pub units_per_em: f64,
    pub axes: Vec<FontAxis>,
    /// Source identifier to location
    pub sources: BTreeMap<String, Location>,
    pub glyph_map: GlyphMap,
    pub glyphs: HashMap<String, VariableGlyph>,
    /// Kern tag to table
    pub kerning: BTreeMap<String, KernTable>,
    #[serde(skip)]
    pub font_binary: Option<Arc<[u8]>>,
}

impl FontData {
    pub fn character_map(&self) -> CharacterMap {
        character_map_from_glyph_map(&self.glyph_map)
    }

    /// A kerning model over a copy of one table
    pub fn kerning_model(&self, kern_tag: &str) -> KerningModel {
        KerningModel::new(
            kern_tag,
            self.kerning.get(kern_tag).cloned(),
            self.axes.clone(),
            self.sources.clone(),
        )
    }

    /// A shaper for this font, engine-backed when a binary is attached.
    pub fn shaper(&self) -> Result<Box<dyn Shaper>, ShaperError> {
        get_shaper(self.font_binary.clone(), self.character_map())
    }

    /// Interpolate a glyph's metrics at a location.
    pub fn instantiate_glyph(&self, glyph_name: &str, location: &Location) -> Option<GlyphInstance> {
        let glyph = self.glyphs.get(glyph_name)?;
        let mut locations = Vec::with_capacity(glyph.sources.len());
        let mut metrics = Vec::with_capacity(glyph.sources.len());
        for (source_identifier, source_metrics) in &glyph.sources {
            match self.sources.get(source_identifier) {
                Some(source_location) => {
                    locations.push(source_location.clone());
                    metrics.push(source_metrics);
                }
                None => warn!(
                    "Glyph '{}' has metrics for unknown source '{}'",
                    glyph_name, source_identifier
                ),
            }
        }
        if metrics.is_empty() {
            return None;
        }

        let model = DiscreteVariationModel::new(&locations, &self.axes);
        let advances: Vec<f64> = metrics.iter().map(|metrics| metrics.x_advance).collect();
        let mut instance = GlyphInstance::new(glyph_name, model.interpolate(location, &advances));

        // Bounds interpolate corner by corner when every source has an outline
        let bounds: Option<Vec<Rect>> = metrics.iter().map(|metrics| metrics.bounds).collect();
        if let Some(bounds) = bounds {
            let corner = |get: fn(&Rect) -> f64| {
                let values: Vec<f64> = bounds.iter().map(get).collect();
                model.interpolate(location, &values)
            };
            instance.bounds = Some(Rect::new(
                corner(|rect| rect.x0),
                corner(|rect| rect.y0),
                corner(|rect| rect.x1),
                corner(|rect| rect.y1),
            ));
        }
        Some(instance)
    }
}
