//! The font store
//!
//! Holds the font data that kerning edits are committed to. Incremental
//! changes are only recorded; final changes are applied to the kerning
//! tables and kept on an undo list together with their rollbacks.

use super::FontData;
use crate::kerning::{ChangeBus, ChangePair, KerningChange, KerningModel};
use crate::layout::{GlyphInstance, GlyphProvider};
use crate::variation::Location;
use std::cell::{Ref, RefCell};
use std::future::{ready, Future};
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct UndoRecord {
    label: String,
    change_pair: ChangePair,
}

#[derive(Debug, Default)]
pub struct FontStore {
    data: RefCell<FontData>,
    incremental: RefCell<Vec<KerningChange>>,
    undo_stack: RefCell<Vec<UndoRecord>>,
    read_only: bool,
}

impl FontStore {
    pub fn new(data: FontData) -> Self {
        Self {
            data: RefCell::new(data),
            ..Default::default()
        }
    }

    pub fn data(&self) -> Ref<'_, FontData> {
        self.data.borrow()
    }

    /// Reject final edits, as for a font opened without write access.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn kerning_model(&self, kern_tag: &str) -> KerningModel {
        self.data.borrow().kerning_model(kern_tag)
    }

    /// Drain the incremental changes received so far.
    pub fn take_incremental_changes(&self) -> Vec<KerningChange> {
        std::mem::take(&mut *self.incremental.borrow_mut())
    }

    /// Labels on the undo list, oldest first
    pub fn undo_labels(&self) -> Vec<String> {
        self.undo_stack
            .borrow()
            .iter()
            .map(|record| record.label.clone())
            .collect()
    }

    /// Roll back the last final change.
    ///
    /// Returns the undone change pair so models holding a copy of the
    /// table can revert it too.
    pub fn undo(&self) -> Option<ChangePair> {
        let record = self.undo_stack.borrow_mut().pop()?;
        record
            .change_pair
            .rollback_change
            .apply_to_tables(&mut self.data.borrow_mut().kerning);
        info!("Undid '{}'", record.label);
        Some(record.change_pair)
    }
}

impl ChangeBus for FontStore {
    fn edit_incremental(&self, change: &KerningChange) {
        debug!(
            "Incremental kerning change on '{}' ({} ops)",
            change.kern_tag,
            change.ops.len()
        );
        self.incremental.borrow_mut().push(change.clone());
    }

    fn edit_final(
        &self,
        change: &KerningChange,
        rollback_change: &KerningChange,
        label: &str,
        is_delete: bool,
    ) -> impl Future<Output = anyhow::Result<()>> {
        let result = if self.read_only {
            Err(anyhow::anyhow!("font is read-only"))
        } else {
            change.apply_to_tables(&mut self.data.borrow_mut().kerning);
            self.undo_stack.borrow_mut().push(UndoRecord {
                label: label.to_string(),
                change_pair: ChangePair {
                    change: change.clone(),
                    rollback_change: rollback_change.clone(),
                },
            });
            debug!(
                "Final kerning change '{}' on '{}' (delete: {})",
                label, change.kern_tag, is_delete
            );
            Ok(())
        };
        ready(result)
    }
}

impl GlyphProvider for FontStore {
    fn has_glyph(&self, glyph_name: &str) -> bool {
        self.data.borrow().glyphs.contains_key(glyph_name)
    }

    fn load_glyph(
        &self,
        glyph_name: &str,
        location: &Location,
    ) -> impl Future<Output = Option<GlyphInstance>> {
        ready(self.data.borrow().instantiate_glyph(glyph_name, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::test_font;
    use crate::kerning::{PairSelector, DEFAULT_KERN_TAG, DEFAULT_THROTTLE};

    #[tokio::test]
    async fn test_edit_commits_to_store_and_undoes() {
        let store = FontStore::new(test_font());
        let mut model = store.kerning_model(DEFAULT_KERN_TAG);
        assert!(model.table().is_none());

        let session = model
            .edit_session(
                vec![PairSelector::new("A", "A", "regular")],
                &store,
                DEFAULT_THROTTLE,
            )
            .unwrap();
        session.edit(&[-40.0], "kern A A").await.unwrap();

        let stored = store.data().kerning[DEFAULT_KERN_TAG].pair_values("A", "A").cloned();
        assert_eq!(stored, Some(vec![Some(-40.0)]));
        assert_eq!(store.undo_labels(), vec!["kern A A".to_string()]);

        let undone = store.undo().unwrap();
        assert!(!store.data().kerning.contains_key(DEFAULT_KERN_TAG));
        model.revert(&undone);
        assert!(model.table().is_none());
        assert!(store.undo().is_none());
    }

    #[tokio::test]
    async fn test_read_only_store_rejects_commits() {
        let mut store = FontStore::new(test_font());
        store.set_read_only(true);
        let mut model = store.kerning_model(DEFAULT_KERN_TAG);
        let session = model
            .edit_session(
                vec![PairSelector::new("A", "A", "regular")],
                &store,
                DEFAULT_THROTTLE,
            )
            .unwrap();
        assert!(session.edit(&[-40.0], "kern A A").await.is_err());
        assert!(model.table().is_none());
        assert!(store.data().kerning.is_empty());
        assert!(store.undo_labels().is_empty());
    }

    #[test]
    fn test_store_provides_glyphs() {
        let store = FontStore::new(test_font());
        assert!(store.has_glyph("A"));
        assert!(!store.has_glyph("B"));
        store.edit_incremental(&KerningChange::new(DEFAULT_KERN_TAG));
        assert_eq!(store.take_incremental_changes().len(), 1);
        assert!(store.take_incremental_changes().is_empty());
    }
}
