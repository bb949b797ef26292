//! Interpolation with discrete axes
//!
//! Sources are split into one partition per combination of discrete axis
//! values. Each partition interpolates over its continuous axes with fontir's
//! variation model; partitions that cannot support one (a single source, no
//! default source, duplicate locations) answer with the nearest source instead.

use super::{normalize_location, Deltas, FontAxis, Location, NormalizedLocation, VariationModel};
use fontdrasil::types::Axes;
use fontir::variations::{self as ir, ModelDeltas, RoundTiesEven};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::{Add, Mul, Sub};
use tracing::debug;

/// A delta that keeps its fractional part.
///
/// fontir rounds deltas for storage in a font binary; interpolated kerning
/// and metrics in the editor stay exact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Exact(f64);

impl Sub for Exact {
    type Output = Exact;

    fn sub(self, rhs: Exact) -> Exact {
        Exact(self.0 - rhs.0)
    }
}

impl Add for Exact {
    type Output = Exact;

    fn add(self, rhs: Exact) -> Exact {
        Exact(self.0 + rhs.0)
    }
}

impl Mul<f64> for Exact {
    type Output = Exact;

    fn mul(self, rhs: f64) -> Exact {
        Exact(self.0 * rhs)
    }
}

impl RoundTiesEven for Exact {
    fn round_ties_even(self) -> Exact {
        self
    }
}

/// Deltas for one partition
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PartitionDeltas {
    Model(ModelDeltas<Exact>),
    /// Raw source values, answered by nearest source
    Values(Vec<f64>),
}

#[derive(Debug, Clone)]
struct Partition {
    discrete_values: Vec<f64>,
    source_indices: Vec<usize>,
    /// Normalized source locations in `source_indices` order
    locations: Vec<NormalizedLocation>,
    model: Option<ir::VariationModel>,
}

#[derive(Debug, Clone)]
pub struct DiscreteVariationModel {
    axes: Vec<FontAxis>,
    partitions: Vec<Partition>,
}

fn discrete_values(location: &Location, axes: &[FontAxis]) -> Vec<f64> {
    axes.iter()
        .filter(|axis| axis.is_discrete())
        .map(|axis| location.get(&axis.name).copied().unwrap_or(axis.default))
        .collect()
}

fn squared_distance(a: &NormalizedLocation, b: &NormalizedLocation) -> f64 {
    let tags: BTreeSet<_> = a.axis_tags().chain(b.axis_tags()).copied().collect();
    tags.into_iter()
        .map(|tag| {
            let value = |location: &NormalizedLocation| {
                location.get(tag).map(|coord| coord.to_f64()).unwrap_or_default()
            };
            let delta = value(a) - value(b);
            delta * delta
        })
        .sum()
}

/// A fontir model over a partition's sources, `None` when the nearest source
/// has to stand in.
fn partition_model(locations: &[NormalizedLocation], axes: &Axes) -> Option<ir::VariationModel> {
    if locations.len() < 2 {
        return None;
    }
    let unique: HashSet<NormalizedLocation> = locations.iter().cloned().collect();
    if unique.len() != locations.len() {
        debug!("Sources share a location, using nearest source");
        return None;
    }
    if !locations.iter().any(|location| location.is_default()) {
        debug!("No source at the default location, using nearest source");
        return None;
    }
    match ir::VariationModel::new(unique, axes.clone()) {
        Ok(model) => Some(model),
        Err(error) => {
            debug!("Using nearest source: {}", error);
            None
        }
    }
}

impl DiscreteVariationModel {
    /// Build a model for sources at `locations` (source space) over `axes`.
    pub fn new(locations: &[Location], axes: &[FontAxis]) -> Self {
        // Point axes have no variation and fontir rejects them
        let ir_axes: Axes = axes
            .iter()
            .filter(|axis| !axis.is_discrete())
            .filter_map(FontAxis::ir_axis)
            .filter(|axis| !axis.is_point())
            .collect();

        let mut partitions: Vec<Partition> = Vec::new();
        for (index, location) in locations.iter().enumerate() {
            let values = discrete_values(location, axes);
            let normalized = normalize_location(location, axes);
            match partitions
                .iter_mut()
                .find(|partition| partition.discrete_values == values)
            {
                Some(partition) => {
                    partition.source_indices.push(index);
                    partition.locations.push(normalized);
                }
                None => partitions.push(Partition {
                    discrete_values: values,
                    source_indices: vec![index],
                    locations: vec![normalized],
                    model: None,
                }),
            }
        }

        for partition in &mut partitions {
            partition.model = partition_model(&partition.locations, &ir_axes);
        }

        Self {
            axes: axes.to_vec(),
            partitions,
        }
    }

    fn partition_for(&self, location: &Location) -> Option<usize> {
        let wanted = discrete_values(location, &self.axes);
        let distance = |partition: &Partition| -> f64 {
            partition
                .discrete_values
                .iter()
                .zip(&wanted)
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        };
        (0..self.partitions.len()).min_by(|a, b| {
            distance(&self.partitions[*a]).total_cmp(&distance(&self.partitions[*b]))
        })
    }
}

impl VariationModel for DiscreteVariationModel {
    fn deltas(&self, source_values: &[f64]) -> Deltas {
        Deltas(
            self.partitions
                .iter()
                .map(|partition| {
                    let values: Vec<f64> = partition
                        .source_indices
                        .iter()
                        .map(|index| source_values.get(*index).copied().unwrap_or_default())
                        .collect();
                    let Some(model) = &partition.model else {
                        return PartitionDeltas::Values(values);
                    };
                    let point_seqs: HashMap<NormalizedLocation, Vec<Exact>> = partition
                        .locations
                        .iter()
                        .cloned()
                        .zip(values.iter().map(|value| vec![Exact(*value)]))
                        .collect();
                    match model.deltas(&point_seqs) {
                        Ok(deltas) => PartitionDeltas::Model(deltas),
                        Err(error) => {
                            debug!("Using nearest source: {}", error);
                            PartitionDeltas::Values(values)
                        }
                    }
                })
                .collect(),
        )
    }

    fn interpolate_from_deltas(&self, location: &Location, deltas: &Deltas) -> f64 {
        let Some(index) = self.partition_for(location) else {
            return 0.0;
        };
        let Some(partition_deltas) = deltas.0.get(index) else {
            return 0.0;
        };
        let normalized = normalize_location(location, &self.axes);
        match partition_deltas {
            PartitionDeltas::Model(deltas) => ir::VariationModel::interpolate_from_deltas(&normalized, deltas)
                .first()
                .map(|value| value.0)
                .unwrap_or_default(),
            PartitionDeltas::Values(values) => self.partitions[index]
                .locations
                .iter()
                .zip(values)
                .min_by(|(a, _), (b, _)| {
                    squared_distance(a, &normalized).total_cmp(&squared_distance(b, &normalized))
                })
                .map(|(_, value)| *value)
                .unwrap_or_default(),
        }
    }
}
