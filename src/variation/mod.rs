//! Design space and interpolation
//!
//! Locations are keyed by axis name in source space. The kerning model only
//! talks to the [`VariationModel`] trait; [`DiscreteVariationModel`] is the
//! implementation the editor uses, built on fontir's variation model.

pub mod discrete;

use fontdrasil::coords::{CoordConverter, NormalizedCoord, UserCoord};
use fontdrasil::types::Axis;
use serde::{Deserialize, Serialize};
use skrifa::Tag;
use std::collections::BTreeMap;
use std::fmt::Debug;

pub use discrete::DiscreteVariationModel;
pub use fontdrasil::coords::NormalizedLocation;

/// A point in design space: axis name to source-space value
pub type Location = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAxis {
    pub name: String,
    pub tag: String,
    pub minimum: f64,
    pub default: f64,
    pub maximum: f64,
    /// Allowed values for a discrete axis, `None` for continuous axes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
}

impl FontAxis {
    pub fn continuous(name: &str, tag: &str, minimum: f64, default: f64, maximum: f64) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            minimum,
            default,
            maximum,
            values: None,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.values.is_some()
    }

    /// Map a source-space value to the normalized range.
    pub fn normalize(&self, value: f64) -> f64 {
        let value = value.clamp(self.minimum, self.maximum);
        if value < self.default {
            (value - self.default) / (self.default - self.minimum)
        } else if value > self.default {
            (value - self.default) / (self.maximum - self.default)
        } else {
            0.0
        }
    }

    /// The axis as fontir models it, `None` when the tag is not a valid
    /// OpenType tag.
    pub fn ir_axis(&self) -> Option<Axis> {
        let tag = self.tag.parse::<Tag>().ok()?;
        let min = UserCoord::new(self.minimum);
        let default = UserCoord::new(self.default);
        let max = UserCoord::new(self.maximum);
        Some(Axis {
            name: self.name.clone(),
            tag,
            min,
            default,
            max,
            hidden: false,
            converter: CoordConverter::unmapped(min, default, max),
            localized_names: Default::default(),
        })
    }
}

/// Default location of a set of axes
pub fn default_location(axes: &[FontAxis]) -> Location {
    axes.iter()
        .map(|axis| (axis.name.clone(), axis.default))
        .collect()
}

/// Re-key a location by axis tag, the form shaping engines take.
pub fn tagged_location(location: &Location, axes: &[FontAxis]) -> BTreeMap<String, f64> {
    axes.iter()
        .filter_map(|axis| {
            let value = location.get(&axis.name)?;
            Some((axis.tag.clone(), *value))
        })
        .collect()
}

/// Normalize the continuous axes of a location, keyed by axis tag. Missing
/// axes sit at their default, unknown axes are dropped.
pub fn normalize_location(location: &Location, axes: &[FontAxis]) -> NormalizedLocation {
    axes.iter()
        .filter(|axis| !axis.is_discrete())
        .filter_map(|axis| {
            let tag = axis.tag.parse::<Tag>().ok()?;
            let value = location.get(&axis.name).copied().unwrap_or(axis.default);
            Some((tag, NormalizedCoord::new(axis.normalize(value))))
        })
        .collect()
}

/// Deltas computed once per set of source values and evaluated many times
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deltas(pub(crate) Vec<discrete::PartitionDeltas>);

/// Interpolation across a fixed set of source locations
pub trait VariationModel: Debug {
    /// Precompute deltas for one value per source, in source order.
    fn deltas(&self, source_values: &[f64]) -> Deltas;

    /// Evaluate precomputed deltas at a source-space location.
    fn interpolate_from_deltas(&self, location: &Location, deltas: &Deltas) -> f64;

    fn interpolate(&self, location: &Location, source_values: &[f64]) -> f64 {
        self.interpolate_from_deltas(location, &self.deltas(source_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight() -> FontAxis {
        FontAxis::continuous("Weight", "wght", 100.0, 400.0, 900.0)
    }

    #[test]
    fn test_normalize_clamps() {
        let axis = weight();
        assert_eq!(axis.normalize(100.0), -1.0);
        assert_eq!(axis.normalize(650.0), 0.5);
        assert_eq!(axis.normalize(2000.0), 1.0);
        assert_eq!(axis.normalize(400.0), 0.0);
    }

    #[test]
    fn test_location_helpers() {
        let axes = vec![weight(), FontAxis::continuous("Width", "wdth", 50.0, 100.0, 200.0)];
        let location: Location = [("Weight".to_string(), 900.0), ("Slant".to_string(), 3.0)]
            .into_iter()
            .collect();

        let normalized = normalize_location(&location, &axes);
        assert_eq!(normalized.get(Tag::new(b"wght")).map(|coord| coord.to_f64()), Some(1.0));
        assert_eq!(normalized.get(Tag::new(b"wdth")).map(|coord| coord.to_f64()), Some(0.0));
        assert_eq!(normalized.iter().count(), 2);

        let tagged = tagged_location(&location, &axes);
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged.get("wght"), Some(&900.0));

        assert_eq!(default_location(&axes).get("Width"), Some(&100.0));
    }

    #[test]
    fn test_ir_axis() {
        let axis = weight().ir_axis().unwrap();
        assert_eq!(axis.tag, Tag::new(b"wght"));
        assert!(!axis.is_point());
        assert!(FontAxis::continuous("Bad", "toolong", 0.0, 0.0, 1.0).ir_axis().is_none());
    }
}
