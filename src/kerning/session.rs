//! Kerning edit sessions
//!
//! A session targets a fixed set of (pair, source) cells. Opening it makes
//! sure every cell exists, so later edits only ever set values. Each way of
//! finishing the session hands one forward change and one rollback change
//! to the change bus, so a whole drag is a single undo step.

use super::changes::{ChangePair, KerningChange, KerningOp};
use super::model::KerningModel;
use super::KerningError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Default interval between incremental broadcasts
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(50);

/// One kerning cell targeted by an edit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSelector {
    pub left_name: String,
    pub right_name: String,
    pub source_identifier: String,
}

impl PairSelector {
    pub fn new(left_name: &str, right_name: &str, source_identifier: &str) -> Self {
        Self {
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            source_identifier: source_identifier.to_string(),
        }
    }
}

/// Where kerning changes are sent
///
/// Incremental changes are previews and may be dropped. Final changes are
/// committed together with their rollback.
pub trait ChangeBus {
    fn edit_incremental(&self, change: &KerningChange);

    fn edit_final(
        &self,
        change: &KerningChange,
        rollback_change: &KerningChange,
        label: &str,
        is_delete: bool,
    ) -> impl Future<Output = anyhow::Result<()>>;
}

pub struct KerningEditSession<'a, B: ChangeBus> {
    model: &'a mut KerningModel,
    bus: &'a B,
    selectors: Vec<PairSelector>,
    setup: ChangePair,
    throttle: Duration,
}

impl<'a, B: ChangeBus> KerningEditSession<'a, B> {
    pub(super) fn open(
        model: &'a mut KerningModel,
        selectors: Vec<PairSelector>,
        bus: &'a B,
        throttle: Duration,
    ) -> Result<Self, KerningError> {
        if selectors.is_empty() {
            return Err(KerningError::EmptySelection);
        }

        let setup = setup_changes(model, &selectors);
        model.apply_change(&setup.change);
        debug!(
            "Opened kerning edit session on {} cells ({} setup ops)",
            selectors.len(),
            setup.change.ops.len()
        );

        Ok(Self {
            model,
            bus,
            selectors,
            setup,
            throttle,
        })
    }

    pub fn selectors(&self) -> &[PairSelector] {
        &self.selectors
    }

    /// Current values of the selected cells, unset cells read as 0.
    pub fn values(&self) -> Vec<f64> {
        self.selectors
            .iter()
            .map(|selector| {
                self.model
                    .source_value(&selector.left_name, &selector.right_name, &selector.source_identifier)
                    .value()
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Set all selected cells and commit in one step.
    pub async fn edit(self, values: &[f64], label: &str) -> Result<ChangePair, KerningError> {
        let step = self.value_change(values)?;
        self.model.apply_change(&step.change);
        self.commit(&step.change, &step.rollback_change, label, false).await
    }

    /// Apply a stream of value snapshots, then commit.
    ///
    /// Snapshots are applied as they arrive. Broadcasts are limited to one
    /// per throttle interval; a snapshot that arrives too early waits in a
    /// single pending slot and is replaced by newer ones. The last snapshot
    /// is always broadcast before the commit. Snapshots with the wrong
    /// number of values are skipped.
    pub async fn edit_continuous(
        self,
        mut snapshots: mpsc::Receiver<Vec<f64>>,
        label: &str,
    ) -> Result<ChangePair, KerningError> {
        let mut first_rollback: Option<KerningChange> = None;
        let mut last_change: Option<KerningChange> = None;
        let mut pending: Option<KerningChange> = None;
        let mut next_broadcast = Instant::now();
        let mut snapshot_count = 0usize;
        let mut broadcast_count = 0usize;

        loop {
            tokio::select! {
                snapshot = snapshots.recv() => {
                    let Some(values) = snapshot else {
                        break;
                    };
                    let step = match self.value_change(&values) {
                        Ok(step) => step,
                        Err(error) => {
                            warn!("Skipping kerning snapshot: {}", error);
                            continue;
                        }
                    };
                    snapshot_count += 1;
                    self.model.apply_change(&step.change);
                    pending = Some(self.setup.change.then(&step.change));
                    first_rollback.get_or_insert(step.rollback_change);
                    last_change = Some(step.change);

                    if Instant::now() >= next_broadcast {
                        if let Some(change) = pending.take() {
                            self.bus.edit_incremental(&change);
                            broadcast_count += 1;
                        }
                        next_broadcast = Instant::now() + self.throttle;
                    }
                }
                _ = sleep_until(next_broadcast), if pending.is_some() => {
                    if let Some(change) = pending.take() {
                        self.bus.edit_incremental(&change);
                        broadcast_count += 1;
                    }
                    next_broadcast = Instant::now() + self.throttle;
                }
            }
        }

        if let Some(change) = pending.take() {
            self.bus.edit_incremental(&change);
            broadcast_count += 1;
        }
        debug!(
            "Continuous kerning edit: {} snapshots, {} broadcasts",
            snapshot_count, broadcast_count
        );

        let (Some(last_change), Some(first_rollback)) = (last_change, first_rollback) else {
            self.discard();
            return Ok(ChangePair::default());
        };
        self.commit(&last_change, &first_rollback, label, false).await
    }

    /// Clear the selected cells and commit.
    ///
    /// A pair whose values all end up unset is removed, and so is a row
    /// left without pairs.
    pub async fn delete(self, label: &str) -> Result<ChangePair, KerningError> {
        let kern_tag = self.model.kern_tag().to_string();
        let mut change = KerningChange::new(&kern_tag);
        let mut rollback = KerningChange::new(&kern_tag);
        let mut cleared: BTreeMap<(String, String), Vec<Option<f64>>> = BTreeMap::new();

        if let Some(table) = self.model.table() {
            for selector in &self.selectors {
                let Some(index) = table.source_index(&selector.source_identifier) else {
                    continue;
                };
                let key = (selector.left_name.clone(), selector.right_name.clone());
                let values = match cleared.entry(key) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        let Some(values) =
                            table.pair_values(&selector.left_name, &selector.right_name)
                        else {
                            continue;
                        };
                        entry.insert(values.clone())
                    }
                };
                if let Some(value) = values.get_mut(index) {
                    *value = None;
                }
            }
        }

        for ((left, right), values) in cleared {
            if let Some(old_values) = self
                .model
                .table()
                .and_then(|table| table.pair_values(&left, &right))
            {
                rollback.ops.insert(
                    0,
                    KerningOp::SetPairValues {
                        left: left.clone(),
                        right: right.clone(),
                        values: Some(old_values.clone()),
                    },
                );
            }
            let values = values.iter().any(Option::is_some).then_some(values);
            change.push(KerningOp::SetPairValues { left, right, values });
        }

        self.model.apply_change(&change);
        self.commit(&change, &rollback, label, true).await
    }

    /// Drop the session without committing, undoing the setup locally.
    pub fn discard(self) {
        self.model.apply_change(&self.setup.rollback_change);
        debug!("Discarded kerning edit session");
    }

    /// The change setting every selected cell, and its inverse.
    fn value_change(&self, values: &[f64]) -> Result<ChangePair, KerningError> {
        if values.len() != self.selectors.len() {
            return Err(KerningError::ValueCountMismatch {
                expected: self.selectors.len(),
                actual: values.len(),
            });
        }
        let kern_tag = self.model.kern_tag();
        let mut change = KerningChange::new(kern_tag);
        let mut rollback = KerningChange::new(kern_tag);
        let table = self.model.table();

        for (selector, value) in self.selectors.iter().zip(values) {
            let Some(index) = table.and_then(|table| table.source_index(&selector.source_identifier))
            else {
                continue;
            };
            let old_value = self
                .model
                .source_value(&selector.left_name, &selector.right_name, &selector.source_identifier)
                .value();
            change.push(KerningOp::SetValue {
                left: selector.left_name.clone(),
                right: selector.right_name.clone(),
                index,
                value: Some(*value),
            });
            rollback.ops.insert(
                0,
                KerningOp::SetValue {
                    left: selector.left_name.clone(),
                    right: selector.right_name.clone(),
                    index,
                    value: old_value,
                },
            );
        }
        Ok(ChangePair {
            change,
            rollback_change: rollback,
        })
    }

    /// Wrap a step with the setup change and send it to the bus. A rejected
    /// commit rolls the model back to where the session started.
    async fn commit(
        self,
        change: &KerningChange,
        rollback_change: &KerningChange,
        label: &str,
        is_delete: bool,
    ) -> Result<ChangePair, KerningError> {
        let change_pair = ChangePair {
            change: self.setup.change.then(change),
            rollback_change: rollback_change.then(&self.setup.rollback_change),
        };
        let result = self
            .bus
            .edit_final(
                &change_pair.change,
                &change_pair.rollback_change,
                label,
                is_delete,
            )
            .await;
        if let Err(error) = result {
            // The bus never took the change, so the model must not keep it
            self.model.apply_change(&change_pair.rollback_change);
            warn!("Kerning edit '{}' was rejected: {:#}", label, error);
            return Err(KerningError::Commit {
                label: label.to_string(),
                message: format!("{error:#}"),
            });
        }
        info!("Committed kerning edit '{}'", label);
        Ok(change_pair)
    }
}

/// Changes that materialize the table, the sources and the value arrays
/// the selectors refer to.
fn setup_changes(model: &KerningModel, selectors: &[PairSelector]) -> ChangePair {
    let kern_tag = model.kern_tag();
    let mut change = KerningChange::new(kern_tag);
    let mut rollback = KerningChange::new(kern_tag);

    let existing = model.table();
    if existing.is_none() {
        change.push(KerningOp::CreateTable);
        rollback.push(KerningOp::DeleteTable);
    }

    let old_sources: Vec<String> = existing
        .map(|table| table.source_identifiers.clone())
        .unwrap_or_default();
    let mut sources = old_sources.clone();
    for selector in selectors {
        if !sources.contains(&selector.source_identifier) {
            sources.push(selector.source_identifier.clone());
        }
    }
    if sources != old_sources {
        change.push(KerningOp::SetSourceIdentifiers {
            source_identifiers: sources.clone(),
        });
        if existing.is_some() {
            rollback.ops.insert(
                0,
                KerningOp::SetSourceIdentifiers {
                    source_identifiers: old_sources,
                },
            );
        }
    }

    let mut padded: Vec<(&str, &str)> = Vec::new();
    for selector in selectors {
        let pair = (selector.left_name.as_str(), selector.right_name.as_str());
        if padded.contains(&pair) {
            continue;
        }
        let old_values = existing.and_then(|table| table.pair_values(pair.0, pair.1));
        let length = old_values.map_or(0, Vec::len);
        if length >= sources.len() {
            continue;
        }
        let mut values = old_values.cloned().unwrap_or_default();
        values.resize(sources.len(), None);
        change.push(KerningOp::SetPairValues {
            left: pair.0.to_string(),
            right: pair.1.to_string(),
            values: Some(values),
        });
        if existing.is_some() {
            rollback.ops.insert(
                0,
                KerningOp::SetPairValues {
                    left: pair.0.to_string(),
                    right: pair.1.to_string(),
                    values: old_values.cloned(),
                },
            );
        }
        padded.push(pair);
    }

    ChangePair {
        change,
        rollback_change: rollback,
    }
}
