/*!
 * Slot registry operations.
 *
 * Slot creation is idempotent: registering the same text for the same key twice
 * leaves the store unchanged. When the source text of a translated slot changes,
 * the translation is kept and the slot is flagged stale for review.
 */

use log::{debug, warn};

use super::models::{hash_text, SlotKey, TranslationSlot};
use super::SlotStore;
use crate::errors::RegistryError;

/// What registering a slot did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChange {
    Created,
    Unchanged,
    /// The stored original was replaced
    Updated {
        /// Whether an existing translation is now stale
        stale: bool,
        previous_original: String,
    },
}

/// Result of registering a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOutcome {
    pub slot: TranslationSlot,
    pub change: SlotChange,
}

impl SlotOutcome {
    /// Whether the caller should surface a stale translation warning
    pub fn is_stale_warning(&self) -> bool {
        matches!(self.change, SlotChange::Updated { stale: true, .. })
    }
}

/// A stored translation checked against the source text it is about to replace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLookup {
    /// No slot, or no translation yet
    Missing,
    Current(String),
    /// The slot was translated from text that no longer matches the source
    Outdated { stored_original: String },
}

/// Registry of translation slots over a storage backend
#[derive(Debug)]
pub struct SlotRegistry<S: SlotStore> {
    store: S,
}

impl<S: SlotStore> SlotRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get or create the slot holding a line's clean text
    pub fn get_or_create_slot(
        &self,
        file_id: &str,
        line_index: usize,
        clean_text: &str,
    ) -> Result<SlotOutcome, RegistryError> {
        self.register(SlotKey::line(file_id, line_index), None, clean_text)
    }

    /// Get or create the slot holding the phrase of a line's n-th link
    pub fn get_or_create_link_slot(
        &self,
        file_id: &str,
        line_index: usize,
        ordinal: usize,
        phrase: &str,
    ) -> Result<SlotOutcome, RegistryError> {
        self.register(SlotKey::link(file_id, line_index, ordinal), None, phrase)
    }

    /// Register a slot under an explicit key, recording its dialogue identifier
    pub fn register(
        &self,
        key: SlotKey,
        dialogue_id: Option<&str>,
        clean_text: &str,
    ) -> Result<SlotOutcome, RegistryError> {
        let Some(mut slot) = self.store.get(&key)? else {
            let slot = TranslationSlot::new(key, dialogue_id.map(str::to_string), clean_text);
            debug!("Created slot {}", slot.key);
            self.store.put(&slot)?;
            return Ok(SlotOutcome {
                slot,
                change: SlotChange::Created,
            });
        };

        let hash = hash_text(clean_text);
        let dialogue_changed = dialogue_id.is_some() && slot.dialogue_id.as_deref() != dialogue_id;

        if slot.original_hash == hash && slot.original_text == clean_text {
            if !dialogue_changed {
                return Ok(SlotOutcome {
                    slot,
                    change: SlotChange::Unchanged,
                });
            }
            slot.dialogue_id = dialogue_id.map(str::to_string);
            slot.touch();
            self.store.put(&slot)?;
            return Ok(SlotOutcome {
                slot,
                change: SlotChange::Updated {
                    stale: false,
                    previous_original: clean_text.to_string(),
                },
            });
        }

        let previous_original = std::mem::replace(&mut slot.original_text, clean_text.to_string());
        slot.original_hash = hash;
        if dialogue_id.is_some() {
            slot.dialogue_id = dialogue_id.map(str::to_string);
        }
        let stale = slot.is_translated();
        if stale {
            slot.stale = true;
            warn!("Source text of {} changed after translation", slot.key);
        }
        slot.touch();
        self.store.put(&slot)?;

        Ok(SlotOutcome {
            slot,
            change: SlotChange::Updated {
                stale,
                previous_original,
            },
        })
    }

    /// Translated clean text of a line, `None` when untranslated
    pub fn lookup_translation(&self, file_id: &str, line_index: usize) -> Result<Option<String>, RegistryError> {
        self.lookup(&SlotKey::line(file_id, line_index))
    }

    /// Translated phrase of a line's n-th link, `None` when untranslated
    pub fn lookup_link_translation(
        &self,
        file_id: &str,
        line_index: usize,
        ordinal: usize,
    ) -> Result<Option<String>, RegistryError> {
        self.lookup(&SlotKey::link(file_id, line_index, ordinal))
    }

    pub fn lookup(&self, key: &SlotKey) -> Result<Option<String>, RegistryError> {
        Ok(self
            .store
            .get(key)?
            .and_then(|slot| slot.translation().map(str::to_string)))
    }

    /// Translation of `key`, only when the slot still holds `source_text` as its original
    pub fn lookup_for_source(&self, key: &SlotKey, source_text: &str) -> Result<SourceLookup, RegistryError> {
        let Some(slot) = self.store.get(key)? else {
            return Ok(SourceLookup::Missing);
        };
        let Some(translated) = slot.translation() else {
            return Ok(SourceLookup::Missing);
        };

        if slot.original_hash != hash_text(source_text) || slot.original_text != source_text {
            return Ok(SourceLookup::Outdated {
                stored_original: slot.original_text.clone(),
            });
        }

        Ok(SourceLookup::Current(translated.to_string()))
    }

    /// Store a translation for an existing slot and clear its stale flag
    pub fn record_translation(&self, key: &SlotKey, translated: &str) -> Result<TranslationSlot, RegistryError> {
        let mut slot = self
            .store
            .get(key)?
            .ok_or_else(|| RegistryError::UnknownSlot(key.to_string()))?;

        slot.translated_text = Some(translated.to_string());
        slot.stale = false;
        slot.touch();
        self.store.put(&slot)?;

        Ok(slot)
    }

    /// Accept the current translation of a stale slot
    pub fn mark_reviewed(&self, key: &SlotKey) -> Result<TranslationSlot, RegistryError> {
        let mut slot = self
            .store
            .get(key)?
            .ok_or_else(|| RegistryError::UnknownSlot(key.to_string()))?;

        if slot.stale {
            slot.stale = false;
            slot.touch();
            self.store.put(&slot)?;
        }

        Ok(slot)
    }

    /// Untranslated slots, at most `limit`
    pub fn pending_slots(&self, limit: usize) -> Result<Vec<TranslationSlot>, RegistryError> {
        self.store.pending(limit)
    }

    /// Slots whose source changed after translation
    pub fn stale_slots(&self) -> Result<Vec<TranslationSlot>, RegistryError> {
        Ok(self
            .store
            .all_slots()?
            .into_iter()
            .filter(|slot| slot.stale)
            .collect())
    }

    /// All rows of one file, as consumed before rebuild
    pub fn rows_for_file(&self, file_id: &str) -> Result<Vec<TranslationSlot>, RegistryError> {
        self.store.slots_for_file(file_id)
    }

    pub fn all_rows(&self) -> Result<Vec<TranslationSlot>, RegistryError> {
        self.store.all_slots()
    }

    pub fn stats(&self) -> Result<super::RegistryStats, RegistryError> {
        self.store.stats()
    }
}
