//! Line layout
//!
//! Turns character lines into positioned glyphs. Glyph metrics are loaded
//! on demand, each line is shaped and kerned, advances are accumulated from
//! the line origin and the finished line is shifted for alignment.
//!
//! A pass can be cancelled from the outside: it checks its [`CancelSignal`]
//! after every suspension point and gives up without a result, so whatever
//! scene was exposed before stays in place.


use crate::core::settings::LayoutSettings;
use crate::kerning::KerningInstance;
use crate::shaping::{
    apply_kerning, build_mapping, ClusterMapping, GlyphAdvances, GlyphFlags, ShapeOptions,
    Shaper, DEFAULT_ADVANCE, DISABLE_KERN_FEATURE, NOTDEF_GLYPH,
};
use crate::text::{suggested_glyph_name, CharacterLine, GlyphRef};
use crate::variation::{tagged_location, FontAxis, Location};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Ascender used for glyph boxes, in ems
pub const ASCENDER: f64 = 0.8;
/// Descender used for glyph boxes, in ems
pub const DESCENDER: f64 = -0.2;

/// Glyphs narrower than this get a widened box so they can be clicked
const MIN_EMPTY_GLYPH_WIDTH: f64 = 30.0;
const EMPTY_GLYPH_PADDING: f64 = 20.0;

/// Horizontal alignment of a line around its origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// X shift applied to a line of the given width
    pub fn offset(self, line_width: f64) -> f64 {
        match self {
            Alignment::Left => 0.0,
            Alignment::Center => -line_width / 2.0,
            Alignment::Right => -line_width,
        }
    }

    /// Horizontal extent covered by a line of the given width
    pub fn extent(self, line_width: f64) -> (f64, f64) {
        let offset = self.offset(line_width);
        (offset, offset + line_width)
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(format!(
                "unknown alignment '{other}', expected left, center or right"
            )),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        };
        f.write_str(name)
    }
}

/// A glyph instantiated at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphInstance {
    pub name: String,
    pub x_advance: f64,
    /// Bounds of the outline, `None` for glyphs without one
    pub bounds: Option<Rect>,
}

impl GlyphInstance {
    pub fn new(name: impl Into<String>, x_advance: f64) -> Self {
        Self {
            name: name.into(),
            x_advance,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Stand-in for a glyph the font does not have
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_ADVANCE)
    }
}

/// Where glyph metrics come from
pub trait GlyphProvider {
    fn has_glyph(&self, glyph_name: &str) -> bool;

    /// Instantiate a glyph, `None` when the font does not have it.
    fn load_glyph(
        &self,
        glyph_name: &str,
        location: &Location,
    ) -> impl Future<Output = Option<GlyphInstance>>;
}

/// Shared flag telling a layout pass to stop
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The glyph the user has selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphSelection {
    pub line_index: usize,
    pub glyph_index: usize,
    pub is_editing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedGlyph {
    pub glyph_name: String,
    /// Set for undefined glyphs so they can be drawn as their character
    pub character: Option<char>,
    pub glyph: GlyphInstance,
    pub position: Point,
    pub cluster: usize,
    /// Kerning applied between this glyph and the previous one
    pub kern_value: f64,
    pub is_undefined: bool,
    pub is_empty: bool,
    pub is_selected: bool,
    pub is_editing: bool,
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedLine {
    pub glyphs: Vec<PositionedGlyph>,
    pub origin: Point,
    /// Pen position after the last glyph, before alignment
    pub end_point: Point,
    pub bounds: Option<Rect>,
    #[serde(skip)]
    pub cluster_mapping: ClusterMapping,
}

/// The result of one layout pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayout {
    pub lines: Vec<PositionedLine>,
    pub longest_line_length: f64,
    pub line_distance: f64,
}

impl SceneLayout {
    /// The kerning handle under a point, as (line index, glyph index).
    ///
    /// The handle of glyph `i` spans the kerning between glyphs `i - 1` and
    /// `i`, widened by `margin` on both sides.
    pub fn kerning_at_point(&self, point: Point, margin: f64) -> Option<(usize, usize)> {
        let (line_index, line) = self
            .lines
            .iter()
            .enumerate()
            .find(|(_, line)| line.bounds.is_some_and(|bounds| bounds.contains(point)))?;
        line.glyphs
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, glyph)| {
                let right = glyph.position.x;
                let left = right - glyph.kern_value;
                let (min, max) = if left <= right { (left, right) } else { (right, left) };
                min - margin <= point.x && point.x <= max + margin
            })
            .map(|(glyph_index, _)| (line_index, glyph_index))
    }

    /// Horizontal extent of the widest line
    pub fn extent(&self, align: Alignment) -> (f64, f64) {
        align.extent(self.longest_line_length)
    }
}

/// Sets lines of glyph references into positioned glyphs
pub struct LineLayoutEngine<'a, P: GlyphProvider> {
    provider: &'a P,
    shaper: &'a mut dyn Shaper,
    kerning: Option<&'a KerningInstance<'a>>,
    settings: &'a LayoutSettings,
    units_per_em: f64,
    location: Location,
    variations: BTreeMap<String, f64>,
    cancel: CancelSignal,
    glyph_instances: HashMap<String, GlyphInstance>,
}

impl<'a, P: GlyphProvider> LineLayoutEngine<'a, P> {
    pub fn new(
        provider: &'a P,
        shaper: &'a mut dyn Shaper,
        settings: &'a LayoutSettings,
        units_per_em: f64,
        location: Location,
    ) -> Self {
        Self {
            provider,
            shaper,
            kerning: None,
            settings,
            units_per_em,
            location,
            variations: BTreeMap::new(),
            cancel: CancelSignal::default(),
            glyph_instances: HashMap::new(),
        }
    }

    /// Kern with this instance when the settings ask for kerning.
    pub fn with_kerning(mut self, kerning: &'a KerningInstance<'a>) -> Self {
        self.kerning = Some(kerning);
        self
    }

    /// Pass the layout location on to the shaper, keyed by axis tag.
    pub fn with_axes(mut self, axes: &[FontAxis]) -> Self {
        self.variations = tagged_location(&self.location, axes);
        self
    }

    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Lay out all lines, top to bottom. `None` when cancelled.
    pub async fn build_scene(
        &mut self,
        lines: &[CharacterLine],
        selection: Option<GlyphSelection>,
    ) -> Option<SceneLayout> {
        let needed: BTreeSet<&str> = lines
            .iter()
            .flatten()
            .filter_map(|glyph_ref| glyph_ref.glyph_name.as_deref())
            .collect();
        for glyph_name in needed {
            self.load_glyph(glyph_name).await;
            if self.cancel.is_cancelled() {
                return None;
            }
        }

        let line_distance = self.settings.line_spacing * self.units_per_em;
        let mut positioned_lines = Vec::with_capacity(lines.len());
        let mut longest_line_length: f64 = 0.0;
        let mut y = 0.0;
        for (line_index, line) in lines.iter().enumerate() {
            let selected = selection.filter(|selection| selection.line_index == line_index);
            let positioned = self.set_line(Point::new(0.0, y), line, selected).await?;
            longest_line_length = longest_line_length.max(positioned.end_point.x);
            y -= line_distance;
            positioned_lines.push(positioned);
        }

        debug!(
            "Laid out {} lines, longest {}",
            positioned_lines.len(),
            longest_line_length
        );
        Some(SceneLayout {
            lines: positioned_lines,
            longest_line_length,
            line_distance,
        })
    }

    /// The editor's kerning replaces any kerning compiled into the font.
    fn shape_options(&self) -> ShapeOptions {
        let mut features = self.settings.features.clone();
        if self.settings.apply_kerning && self.kerning.is_some() {
            features.push(DISABLE_KERN_FEATURE.to_string());
        }
        ShapeOptions {
            variations: self.variations.clone(),
            features,
        }
    }

    /// Lay out one line starting at `origin`. `None` when cancelled.
    pub async fn set_line(
        &mut self,
        origin: Point,
        line: &[GlyphRef],
        selection: Option<GlyphSelection>,
    ) -> Option<PositionedLine> {
        let text: String = line
            .iter()
            .map(|glyph_ref| match glyph_ref.character {
                Some(ch) => ch,
                None => self
                    .shaper
                    .pua_character(glyph_ref.glyph_name.as_deref().unwrap_or(NOTDEF_GLYPH)),
            })
            .collect();
        let chars: Vec<char> = text.chars().collect();
        let options = self.shape_options();

        let mut shaped = self.shaper.shape(&text, &self.advances(), &options);
        let mut needs_reshape = false;
        for glyph_name in shaped.iter().map(|glyph| glyph.glyph_name.clone()).collect::<Vec<_>>() {
            if !self.glyph_instances.contains_key(&glyph_name) && self.provider.has_glyph(&glyph_name)
            {
                self.load_glyph(&glyph_name).await;
                if self.cancel.is_cancelled() {
                    return None;
                }
                needs_reshape = true;
            }
        }
        if needs_reshape {
            shaped = self.shaper.shape(&text, &self.advances(), &options);
        }

        if self.settings.apply_kerning {
            if let Some(kerning) = self.kerning {
                apply_kerning(&mut shaped, |left, right| {
                    kerning.pair_value(left, right).value()
                });
            }
        }

        let mut glyphs: Vec<PositionedGlyph> = Vec::with_capacity(shaped.len());
        let mut x = origin.x;
        let mut y = origin.y;
        for (glyph_index, shaped_glyph) in shaped.iter().enumerate() {
            let source_char = chars.get(shaped_glyph.cluster).copied();
            let pua_glyph_name = source_char
                .and_then(|ch| self.shaper.pua_glyph_name(ch))
                .map(str::to_string);
            let code_point = source_char.filter(|_| pua_glyph_name.is_none());

            let glyph_name = if shaped_glyph.glyph_name != NOTDEF_GLYPH {
                shaped_glyph.glyph_name.clone()
            } else {
                code_point
                    .map(suggested_glyph_name)
                    .unwrap_or_else(|| shaped_glyph.glyph_name.clone())
            };

            let instance = self.glyph_instances.get(&glyph_name).cloned();
            let is_undefined = instance.is_none();
            let glyph = instance.unwrap_or_else(|| GlyphInstance::placeholder(glyph_name.clone()));

            let kern_value = match glyphs.last() {
                Some(previous) if shaped_glyph.flags.contains(GlyphFlags::KERNED) => {
                    shaped[glyph_index - 1].x_advance - previous.glyph.x_advance
                }
                _ => 0.0,
            };

            let is_selected = selection.is_some_and(|selection| selection.glyph_index == glyph_index);
            glyphs.push(PositionedGlyph {
                glyph_name: if is_undefined {
                    pua_glyph_name.unwrap_or(glyph_name)
                } else {
                    glyph_name
                },
                character: if is_undefined { code_point } else { None },
                is_empty: glyph.bounds.is_none(),
                glyph,
                position: Point::new(x + shaped_glyph.x_offset, y + shaped_glyph.y_offset),
                cluster: shaped_glyph.cluster,
                kern_value,
                is_undefined,
                is_selected,
                is_editing: is_selected && selection.is_some_and(|selection| selection.is_editing),
                bounds: Rect::ZERO,
            });

            x += shaped_glyph.x_advance;
            y += shaped_glyph.y_advance;
        }

        let offset = self.settings.align.offset(x - origin.x);
        if offset != 0.0 {
            for glyph in &mut glyphs {
                glyph.position.x += offset;
            }
        }

        add_bounding_boxes(
            &mut glyphs,
            DESCENDER * self.units_per_em,
            ASCENDER * self.units_per_em,
        );
        let bounds = glyphs
            .iter()
            .map(|glyph| glyph.bounds)
            .reduce(|union, bounds| union.union(bounds));
        let clusters: Vec<usize> = shaped.iter().map(|glyph| glyph.cluster).collect();

        Some(PositionedLine {
            glyphs,
            origin,
            end_point: Point::new(x, origin.y),
            bounds,
            cluster_mapping: build_mapping(&clusters, chars.len()),
        })
    }

    /// Cached glyph instances, by name
    pub fn glyph_instances(&self) -> &HashMap<String, GlyphInstance> {
        &self.glyph_instances
    }

    async fn load_glyph(&mut self, glyph_name: &str) {
        if self.glyph_instances.contains_key(glyph_name) {
            return;
        }
        if let Some(instance) = self.provider.load_glyph(glyph_name, &self.location).await {
            self.glyph_instances.insert(glyph_name.to_string(), instance);
        }
    }

    fn advances(&self) -> GlyphAdvances {
        self.glyph_instances
            .iter()
            .map(|(name, instance)| (name.clone(), instance.x_advance))
            .collect()
    }
}

/// Give every glyph a box in line coordinates.
///
/// Glyphs with an outline use its bounds. Empty glyphs get a box spanning
/// their advance between descender and ascender, widened when narrow.
fn add_bounding_boxes(glyphs: &mut [PositionedGlyph], descender: f64, ascender: f64) {
    for glyph in glyphs {
        let local = match glyph.glyph.bounds {
            Some(bounds) if !glyph.is_empty => bounds,
            _ => {
                let bounds = Rect::new(0.0, descender, glyph.glyph.x_advance, ascender);
                if glyph.glyph.x_advance < MIN_EMPTY_GLYPH_WIDTH {
                    bounds.inflate(EMPTY_GLYPH_PADDING, 0.0)
                } else {
                    bounds
                }
            }
        };
        glyph.bounds = local + Vec2::new(glyph.position.x, glyph.position.y);
    }
}

/// The layout currently on screen and the pass that will replace it
#[derive(Debug, Default)]
pub struct TextScene {
    layout: SceneLayout,
    pending: Option<CancelSignal>,
}

impl TextScene {
    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    /// Start a new pass, cancelling the one in flight.
    pub fn begin_update(&mut self) -> CancelSignal {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        let signal = CancelSignal::new();
        self.pending = Some(signal.clone());
        signal
    }

    /// Expose the result of a pass. Returns whether it was taken.
    ///
    /// Results of cancelled or failed passes are dropped.
    pub fn finish_update(&mut self, signal: &CancelSignal, layout: Option<SceneLayout>) -> bool {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| Arc::ptr_eq(&pending.0, &signal.0));
        if is_current {
            self.pending = None;
        }
        match layout {
            Some(layout) if is_current && !signal.is_cancelled() => {
                self.layout = layout;
                true
            }
            _ => false,
        }
    }
}
