/*!
 * Tests for the SQLite-backed slot registry
 */

use vnloc::registry::{
    DatabaseConnection, RegistryStats, SlotChange, SlotKey, SlotRegistry, SlotRepository, SlotStore,
};

use crate::common::create_temp_dir;

fn memory_registry() -> SlotRegistry<SlotRepository> {
    SlotRegistry::new(SlotRepository::new_in_memory().unwrap())
}

/// Test that slots survive reopening the database file
#[test]
fn test_registry_withFileDatabase_shouldPersistAcrossConnections() {
    let dir = create_temp_dir().unwrap();
    let db_path = dir.path().join("nested").join("slots.db");

    {
        let registry = SlotRegistry::new(SlotRepository::new(DatabaseConnection::new(&db_path).unwrap()));
        registry.get_or_create_slot("ch01.txt", 4, "猫がいる").unwrap();
        registry
            .record_translation(&SlotKey::line("ch01.txt", 4), "Có con mèo")
            .unwrap();
    }

    let reopened = SlotRegistry::new(SlotRepository::new(DatabaseConnection::new(&db_path).unwrap()));
    assert_eq!(
        reopened.lookup_translation("ch01.txt", 4).unwrap().as_deref(),
        Some("Có con mèo")
    );
}

/// Test that registering the same text twice changes nothing
#[test]
fn test_getOrCreateSlot_withSqlite_shouldBeIdempotent() {
    let registry = memory_registry();

    let first = registry.get_or_create_slot("a.txt", 0, "一").unwrap();
    let second = registry.get_or_create_slot("a.txt", 0, "一").unwrap();

    assert_eq!(first.change, SlotChange::Created);
    assert_eq!(second.change, SlotChange::Unchanged);
    assert_eq!(registry.all_rows().unwrap().len(), 1);
}

/// Test the stale flow through the SQLite store
#[test]
fn test_changedSource_withSqlite_shouldKeepTranslationAndFlagStale() {
    let registry = memory_registry();
    let key = SlotKey::line("a.txt", 0);
    registry.get_or_create_slot("a.txt", 0, "古い").unwrap();
    registry.record_translation(&key, "cũ").unwrap();

    let outcome = registry.get_or_create_slot("a.txt", 0, "新しい").unwrap();

    assert!(outcome.is_stale_warning());
    let stored = registry.store().get(&key).unwrap().unwrap();
    assert!(stored.stale);
    assert_eq!(stored.original_text, "新しい");
    assert_eq!(stored.translated_text.as_deref(), Some("cũ"));

    registry.record_translation(&key, "mới").unwrap();
    assert!(registry.stale_slots().unwrap().is_empty());
}

/// Test that link sub-slots are ordered after their line slot
#[test]
fn test_rowsForFile_shouldOrderLinesThenLinks() {
    let registry = memory_registry();
    registry.get_or_create_link_slot("a.txt", 2, 1, "二つ目").unwrap();
    registry.get_or_create_slot("a.txt", 10, "十").unwrap();
    registry.get_or_create_link_slot("a.txt", 2, 0, "一つ目").unwrap();
    registry.get_or_create_slot("a.txt", 2, "二").unwrap();
    registry.get_or_create_slot("b.txt", 0, "別").unwrap();

    let keys: Vec<String> = registry
        .rows_for_file("a.txt")
        .unwrap()
        .iter()
        .map(|slot| slot.key.to_string())
        .collect();

    assert_eq!(keys, vec!["a.txt#2", "a.txt#2/link0", "a.txt#2/link1", "a.txt#10"]);
}

/// Test the aggregate counts
#[test]
fn test_stats_shouldCountTranslatedPendingAndStale() {
    let registry = memory_registry();
    registry.get_or_create_slot("a.txt", 0, "一").unwrap();
    registry.get_or_create_slot("a.txt", 1, "二").unwrap();
    registry.get_or_create_slot("a.txt", 2, "三").unwrap();
    registry.record_translation(&SlotKey::line("a.txt", 0), "một").unwrap();
    registry.record_translation(&SlotKey::line("a.txt", 1), "hai").unwrap();
    registry.get_or_create_slot("a.txt", 1, "弐").unwrap();

    assert_eq!(
        registry.stats().unwrap(),
        RegistryStats {
            total: 3,
            translated: 2,
            pending: 1,
            stale: 1,
        }
    );
}

/// Test that a blank stored translation counts as missing
#[test]
fn test_lookupTranslation_withBlankTranslation_shouldReturnNone() {
    let registry = memory_registry();
    registry.get_or_create_slot("a.txt", 0, "一").unwrap();
    registry.record_translation(&SlotKey::line("a.txt", 0), "   ").unwrap();

    assert_eq!(registry.lookup_translation("a.txt", 0).unwrap(), None);
    assert_eq!(registry.pending_slots(10).unwrap().len(), 1);
}
