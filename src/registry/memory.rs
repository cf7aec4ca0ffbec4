/*!
 * In-memory slot storage for tests and dry runs.
 */

use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::models::{SlotKey, TranslationSlot};
use super::SlotStore;
use crate::errors::RegistryError;

/// Slot storage held in a sorted map
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RwLock<BTreeMap<SlotKey, TranslationSlot>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }
}

impl SlotStore for MemorySlotStore {
    fn get(&self, key: &SlotKey) -> Result<Option<TranslationSlot>, RegistryError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn put(&self, slot: &TranslationSlot) -> Result<(), RegistryError> {
        self.slots.write().insert(slot.key.clone(), slot.clone());
        Ok(())
    }

    fn slots_for_file(&self, file_id: &str) -> Result<Vec<TranslationSlot>, RegistryError> {
        Ok(self
            .slots
            .read()
            .values()
            .filter(|slot| slot.key.file_id == file_id)
            .cloned()
            .collect())
    }

    fn all_slots(&self) -> Result<Vec<TranslationSlot>, RegistryError> {
        Ok(self.slots.read().values().cloned().collect())
    }

    fn pending(&self, limit: usize) -> Result<Vec<TranslationSlot>, RegistryError> {
        Ok(self
            .slots
            .read()
            .values()
            .filter(|slot| slot.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }
}
