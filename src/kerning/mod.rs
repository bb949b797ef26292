//! Variable kerning
//!
//! - `table.rs`: the kerning table data
//! - `changes.rs`: change operations with their rollbacks
//! - `model.rs`: group resolution and interpolated lookups
//! - `session.rs`: throttled, atomic editing
//! - `utils.rs`: flipping, merging and splitting tables

pub mod changes;
pub mod model;
pub mod session;
pub mod table;
pub mod utils;


use thiserror::Error;

pub use changes::{ChangePair, GroupSide, KerningChange, KerningOp};
pub use model::{KerningInstance, KerningModel, PairValue};
pub use session::{ChangeBus, KerningEditSession, PairSelector, DEFAULT_THROTTLE};
pub use table::{group_key, group_name, KernTable, KerningGroups, KerningValues, GROUP_PREFIX};

/// Kern tag of the default kerning table
pub const DEFAULT_KERN_TAG: &str = "kern";

#[derive(Debug, Error)]
pub enum KerningError {
    #[error("an edit session needs at least one pair")]
    EmptySelection,
    #[error("expected {expected} kerning values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },
    #[error("failed to commit '{label}': {message}")]
    Commit { label: String, message: String },
    #[error("kerning tables use different sources")]
    IncompatibleSources,
}
