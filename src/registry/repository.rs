/*!
 * SQLite-backed slot storage.
 *
 * Implements the `SlotStore` get/put contract over the `slots` table.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::connection::DatabaseConnection;
use super::models::{RegistryStats, SlotKey, TranslationSlot};
use super::SlotStore;
use crate::errors::RegistryError;

const SLOT_COLUMNS: &str = "file_id, line_index, link_ordinal, dialogue_id, original_text, \
     original_hash, translated_text, stale, created_at, updated_at";

const SLOT_ORDER: &str = "ORDER BY file_id, line_index, COALESCE(link_ordinal, -1)";

/// Slot storage on top of a SQLite database
#[derive(Clone)]
pub struct SlotRepository {
    db: DatabaseConnection,
}

impl SlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open the repository at the default location under the user data directory
    pub fn new_default() -> Result<Self> {
        let path = DatabaseConnection::default_database_path()?;
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn row_to_slot(row: &Row<'_>) -> rusqlite::Result<TranslationSlot> {
        let file_id: String = row.get(0)?;
        let line_index: i64 = row.get(1)?;
        let link_ordinal: Option<i64> = row.get(2)?;

        Ok(TranslationSlot {
            key: SlotKey {
                file_id,
                line_index: line_index as usize,
                link_ordinal: link_ordinal.map(|ordinal| ordinal as usize),
            },
            dialogue_id: row.get(3)?,
            original_text: row.get(4)?,
            original_hash: row.get(5)?,
            translated_text: row.get(6)?,
            stale: row.get::<_, i64>(7)? != 0,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn query_slots(conn: &Connection, filter: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<TranslationSlot>> {
        let sql = format!("SELECT {} FROM slots {} {}", SLOT_COLUMNS, filter, SLOT_ORDER);
        let mut stmt = conn.prepare(&sql)?;
        let slots = stmt
            .query_map(params, Self::row_to_slot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(slots)
    }

    fn upsert(conn: &Connection, slot: &TranslationSlot) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO slots (
                slot_key, file_id, line_index, link_ordinal, kind, dialogue_id,
                original_text, original_hash, translated_text, stale, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(slot_key) DO UPDATE SET
                dialogue_id = excluded.dialogue_id,
                original_text = excluded.original_text,
                original_hash = excluded.original_hash,
                translated_text = excluded.translated_text,
                stale = excluded.stale,
                updated_at = excluded.updated_at
            "#,
            params![
                slot.key.to_string(),
                slot.key.file_id,
                slot.key.line_index as i64,
                slot.key.link_ordinal.map(|ordinal| ordinal as i64),
                slot.key.kind().to_string(),
                slot.dialogue_id,
                slot.original_text,
                slot.original_hash,
                slot.translated_text,
                slot.stale as i64,
                slot.created_at,
                slot.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Store many slots in one transaction
    pub fn put_many(&self, slots: &[TranslationSlot]) -> Result<(), RegistryError> {
        debug!("Writing {} slots in one transaction", slots.len());
        self.db
            .transaction(|tx| {
                for slot in slots {
                    Self::upsert(tx, slot)?;
                }
                Ok(())
            })
            .map_err(RegistryError::from)
    }
}

impl SlotStore for SlotRepository {
    fn get(&self, key: &SlotKey) -> Result<Option<TranslationSlot>, RegistryError> {
        let slot_key = key.to_string();
        self.db
            .execute(|conn| {
                let sql = format!("SELECT {} FROM slots WHERE slot_key = ?1", SLOT_COLUMNS);
                let slot = conn
                    .query_row(&sql, [slot_key.as_str()], Self::row_to_slot)
                    .optional()?;
                Ok(slot)
            })
            .map_err(RegistryError::from)
    }

    fn put(&self, slot: &TranslationSlot) -> Result<(), RegistryError> {
        self.db
            .execute(|conn| Self::upsert(conn, slot))
            .map_err(RegistryError::from)
    }

    fn slots_for_file(&self, file_id: &str) -> Result<Vec<TranslationSlot>, RegistryError> {
        self.db
            .execute(|conn| Self::query_slots(conn, "WHERE file_id = ?1", &[&file_id]))
            .map_err(RegistryError::from)
    }

    fn all_slots(&self) -> Result<Vec<TranslationSlot>, RegistryError> {
        self.db
            .execute(|conn| Self::query_slots(conn, "", &[]))
            .map_err(RegistryError::from)
    }

    fn pending(&self, limit: usize) -> Result<Vec<TranslationSlot>, RegistryError> {
        let filter = format!(
            "WHERE (translated_text IS NULL OR TRIM(translated_text) = '') \
             AND TRIM(original_text) != '' {} LIMIT {}",
            SLOT_ORDER, limit
        );
        self.db
            .execute(|conn| {
                let sql = format!("SELECT {} FROM slots {}", SLOT_COLUMNS, filter);
                let mut stmt = conn.prepare(&sql)?;
                let slots = stmt
                    .query_map([], Self::row_to_slot)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(slots)
            })
            .map_err(RegistryError::from)
    }

    fn stats(&self) -> Result<RegistryStats, RegistryError> {
        self.db
            .execute(|conn| {
                let stats = conn.query_row(
                    r#"
                    SELECT
                        COUNT(*),
                        COALESCE(SUM(CASE WHEN translated_text IS NOT NULL AND TRIM(translated_text) != '' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN (translated_text IS NULL OR TRIM(translated_text) = '') AND TRIM(original_text) != '' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(stale), 0)
                    FROM slots
                    "#,
                    [],
                    |row| {
                        Ok(RegistryStats {
                            total: row.get::<_, i64>(0)? as usize,
                            translated: row.get::<_, i64>(1)? as usize,
                            pending: row.get::<_, i64>(2)? as usize,
                            stale: row.get::<_, i64>(3)? as usize,
                        })
                    },
                )?;
                Ok(stats)
            })
            .map_err(RegistryError::from)
    }
}
