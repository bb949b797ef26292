//! Reading kerning at design-space locations
//!
//! A [`KerningModel`] wraps one kerning table. Lookups resolve glyphs to
//! their groups, pick the most specific pair that has data, and interpolate
//! the pair's per-source values. Interpolation deltas are cached per pair
//! key; the cache is dropped wholesale when groups, sources or axes change.

use super::changes::{ChangePair, KerningChange};
use super::session::{ChangeBus, KerningEditSession, PairSelector};
use super::table::{group_key, KernTable};
use super::KerningError;
use crate::variation::{Deltas, DiscreteVariationModel, FontAxis, Location, VariationModel};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

/// A kerning lookup result
///
/// `Absent` means there is no kerning data for the pair at all,
/// `Present(None)` means the pair exists but has no value at the queried
/// source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PairValue {
    Absent,
    Present(Option<f64>),
}

impl PairValue {
    /// The value, treating both kinds of absence alike
    pub fn value(self) -> Option<f64> {
        match self {
            PairValue::Present(value) => value,
            PairValue::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        self == PairValue::Absent
    }
}

type PairKey = (String, String);

#[derive(Debug, Default)]
struct PairFunctionCache {
    generation: u64,
    deltas: HashMap<PairKey, Option<Deltas>>,
}

#[derive(Debug)]
pub struct KerningModel {
    kern_tag: String,
    table: Option<KernTable>,
    axes: Vec<FontAxis>,
    source_locations: BTreeMap<String, Location>,
    variation_model: Box<dyn VariationModel>,
    left_groups: HashMap<String, String>,
    right_groups: HashMap<String, String>,
    generation: u64,
    pair_functions: RefCell<PairFunctionCache>,
}

fn reverse_group_index(groups: &BTreeMap<String, Vec<String>>) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for (group_name, glyph_names) in groups {
        for glyph_name in glyph_names {
            index.insert(glyph_name.clone(), group_key(group_name));
        }
    }
    index
}

impl KerningModel {
    /// Wrap a kerning table (or its absence).
    ///
    /// `source_locations` holds every font source; the table's source
    /// identifiers are looked up in it.
    pub fn new(
        kern_tag: impl Into<String>,
        table: Option<KernTable>,
        axes: Vec<FontAxis>,
        source_locations: BTreeMap<String, Location>,
    ) -> Self {
        let mut model = Self {
            kern_tag: kern_tag.into(),
            table,
            axes,
            source_locations,
            variation_model: Box::new(DiscreteVariationModel::new(&[], &[])),
            left_groups: HashMap::new(),
            right_groups: HashMap::new(),
            generation: 0,
            pair_functions: RefCell::default(),
        };
        model.rebuild();
        model
    }

    pub fn kern_tag(&self) -> &str {
        &self.kern_tag
    }

    pub fn table(&self) -> Option<&KernTable> {
        self.table.as_ref()
    }

    pub fn axes(&self) -> &[FontAxis] {
        &self.axes
    }

    pub fn set_axes(&mut self, axes: Vec<FontAxis>) {
        self.axes = axes;
        self.rebuild();
    }

    pub fn set_source_locations(&mut self, source_locations: BTreeMap<String, Location>) {
        self.source_locations = source_locations;
        self.rebuild();
    }

    /// Location of a font source, `None` for unknown identifiers
    pub fn source_location(&self, source_identifier: &str) -> Option<&Location> {
        self.source_locations.get(source_identifier)
    }

    /// Recompute everything derived from groups, sources and axes.
    fn rebuild(&mut self) {
        let source_identifiers = self
            .table
            .as_ref()
            .map(|table| table.source_identifiers.as_slice())
            .unwrap_or_default();
        let locations: Vec<Location> = source_identifiers
            .iter()
            .map(|identifier| match self.source_locations.get(identifier) {
                Some(location) => location.clone(),
                None => {
                    warn!("Kerning refers to unknown source '{}'", identifier);
                    Location::new()
                }
            })
            .collect();
        self.variation_model = Box::new(DiscreteVariationModel::new(&locations, &self.axes));

        let (left_groups, right_groups) = match &self.table {
            Some(table) => (
                reverse_group_index(&table.groups_side1),
                reverse_group_index(&table.groups_side2),
            ),
            None => Default::default(),
        };
        self.left_groups = left_groups;
        self.right_groups = right_groups;

        self.generation += 1;
        debug!(
            "Rebuilt kerning model '{}' with {} sources",
            self.kern_tag,
            locations.len()
        );
    }

    /// Apply a change to the local table and invalidate what it touched.
    pub fn apply_change(&mut self, change: &KerningChange) {
        change.apply_to(&mut self.table);
        if change.is_structural() {
            self.rebuild();
            return;
        }
        let mut cache = self.pair_functions.borrow_mut();
        for (left, right) in change.ops.iter().filter_map(|op| op.pair()) {
            cache.deltas.remove(&(left.to_string(), right.to_string()));
        }
    }

    /// The group key a glyph belongs to on the left side
    pub fn left_group(&self, glyph_name: &str) -> Option<&str> {
        self.left_groups.get(glyph_name).map(String::as_str)
    }

    pub fn right_group(&self, glyph_name: &str) -> Option<&str> {
        self.right_groups.get(glyph_name).map(String::as_str)
    }

    /// Candidate pair keys, most specific first
    fn pairs_to_try<'a>(&'a self, left_glyph: &'a str, right_glyph: &'a str) -> Vec<(&'a str, &'a str)> {
        let left_group = self.left_group(left_glyph);
        let right_group = self.right_group(right_glyph);
        [
            (Some(left_glyph), Some(right_glyph)),
            (Some(left_glyph), right_group),
            (left_group, Some(right_glyph)),
            (left_group, right_group),
        ]
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        })
        .collect()
    }

    /// The most specific pair keys that have data
    fn resolve_pair<'a>(
        &'a self,
        left_glyph: &'a str,
        right_glyph: &'a str,
    ) -> Option<(&'a str, &'a str)> {
        let table = self.table.as_ref()?;
        self.pairs_to_try(left_glyph, right_glyph)
            .into_iter()
            .find(|(left, right)| table.has_pair(left, right))
    }

    /// Kerning for a glyph pair.
    ///
    /// With a source identifier the stored value at that source is returned
    /// as is; otherwise the pair is interpolated at `location`.
    pub fn pair_value(
        &self,
        left_glyph: &str,
        right_glyph: &str,
        location: &Location,
        source_identifier: Option<&str>,
    ) -> PairValue {
        let Some((left, right)) = self.resolve_pair(left_glyph, right_glyph) else {
            return PairValue::Absent;
        };
        match source_identifier {
            Some(source_identifier) => self.source_value(left, right, source_identifier),
            None => self
                .interpolate_pair(left, right, location)
                .map_or(PairValue::Absent, |value| PairValue::Present(Some(value))),
        }
    }

    /// The raw value stored for pair keys at one source.
    pub fn source_value(&self, left_key: &str, right_key: &str, source_identifier: &str) -> PairValue {
        let Some(table) = self.table.as_ref() else {
            return PairValue::Absent;
        };
        let (Some(values), Some(index)) = (
            table.pair_values(left_key, right_key),
            table.source_index(source_identifier),
        ) else {
            return PairValue::Absent;
        };
        PairValue::Present(values.get(index).copied().flatten())
    }

    fn interpolate_pair(&self, left_key: &str, right_key: &str, location: &Location) -> Option<f64> {
        let mut cache = self.pair_functions.borrow_mut();
        if cache.generation != self.generation {
            cache.deltas.clear();
            cache.generation = self.generation;
        }
        let key = (left_key.to_string(), right_key.to_string());
        let deltas = cache.deltas.entry(key).or_insert_with(|| {
            let table = self.table.as_ref()?;
            let values = table.pair_values(left_key, right_key)?;
            let mut source_values: Vec<f64> =
                values.iter().map(|value| value.unwrap_or_default()).collect();
            if source_values.len() < table.source_identifiers.len() {
                source_values.resize(table.source_identifiers.len(), 0.0);
            }
            Some(self.variation_model.deltas(&source_values))
        });
        deltas
            .as_ref()
            .map(|deltas| self.variation_model.interpolate_from_deltas(location, deltas))
    }

    /// Pair keys an edit of this glyph pair should target.
    ///
    /// The pair that currently provides the kerning wins; a new pair uses
    /// the glyphs' groups where they have them.
    pub fn pair_names(&self, left_glyph: &str, right_glyph: &str) -> (String, String) {
        if let Some((left, right)) = self.resolve_pair(left_glyph, right_glyph) {
            return (left.to_string(), right.to_string());
        }
        (
            self.left_group(left_glyph).unwrap_or(left_glyph).to_string(),
            self.right_group(right_glyph).unwrap_or(right_glyph).to_string(),
        )
    }

    /// A lookup bound to one location, with its own result cache.
    pub fn instantiate(&self, location: Location) -> KerningInstance<'_> {
        KerningInstance {
            model: self,
            location,
            cache: RefCell::default(),
        }
    }

    /// Open an edit session on the given cells.
    pub fn edit_session<'a, B: ChangeBus>(
        &'a mut self,
        selectors: Vec<PairSelector>,
        bus: &'a B,
        throttle: Duration,
    ) -> Result<KerningEditSession<'a, B>, KerningError> {
        KerningEditSession::open(self, selectors, bus, throttle)
    }

    /// Undo or redo a committed change pair locally.
    pub fn revert(&mut self, change_pair: &ChangePair) {
        self.apply_change(&change_pair.rollback_change);
    }
}

/// Kerning at one location
pub struct KerningInstance<'m> {
    model: &'m KerningModel,
    location: Location,
    cache: RefCell<HashMap<PairKey, PairValue>>,
}

impl KerningInstance<'_> {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn pair_value(&self, left_glyph: &str, right_glyph: &str) -> PairValue {
        let key = (left_glyph.to_string(), right_glyph.to_string());
        if let Some(value) = self.cache.borrow().get(&key) {
            return *value;
        }
        let value = self
            .model
            .pair_value(left_glyph, right_glyph, &self.location, None);
        self.cache.borrow_mut().insert(key, value);
        value
    }
}
