/*!
 * Translation slot registry.
 *
 * Maps every extracted clean text to a stable key derived from its file and line,
 * and persists `(key, original, translated)` rows:
 * - `SlotStore`: the get/put storage contract
 * - `SlotRepository`: SQLite storage with a versioned schema
 * - `MemorySlotStore`: in-memory storage
 * - `SlotRegistry`: idempotent slot creation, lookup and review operations
 */

pub mod connection;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;
pub mod service;

pub use connection::DatabaseConnection;
pub use memory::MemorySlotStore;
pub use models::{RegistryStats, SlotKey, SlotKind, TranslationSlot};
pub use repository::SlotRepository;
pub use service::{SlotChange, SlotOutcome, SlotRegistry, SourceLookup};

use crate::errors::RegistryError;

/// Storage contract for translation slots
///
/// Implementations must be shareable across the worker threads of a batch run.
pub trait SlotStore: Send + Sync {
    /// Fetch a slot by key
    fn get(&self, key: &SlotKey) -> Result<Option<TranslationSlot>, RegistryError>;

    /// Insert or replace a slot
    fn put(&self, slot: &TranslationSlot) -> Result<(), RegistryError>;

    /// All slots of one file ordered by line then link ordinal
    fn slots_for_file(&self, file_id: &str) -> Result<Vec<TranslationSlot>, RegistryError>;

    /// Every slot in key order
    fn all_slots(&self) -> Result<Vec<TranslationSlot>, RegistryError>;

    /// Untranslated slots in key order, at most `limit`
    fn pending(&self, limit: usize) -> Result<Vec<TranslationSlot>, RegistryError>;

    /// Aggregate counts
    fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let slots = self.all_slots()?;
        Ok(RegistryStats {
            total: slots.len(),
            translated: slots.iter().filter(|slot| slot.is_translated()).count(),
            pending: slots.iter().filter(|slot| slot.is_pending()).count(),
            stale: slots.iter().filter(|slot| slot.stale).count(),
        })
    }
}
