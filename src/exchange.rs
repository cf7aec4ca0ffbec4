/*!
 * Hand-editing exchange and review of registry rows.
 *
 * Rows are exported as a JSON array of `(key, original, translated)` records.
 * On import a row is applied only when its original still matches the stored
 * one, so edits made against an older source never overwrite newer slots.
 */

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::file_utils::FileManager;
use crate::registry::{SlotKey, SlotRegistry, SlotStore, TranslationSlot};

/// One exported registry row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRow {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue_id: Option<String>,
    pub original: String,
    /// Empty when untranslated
    #[serde(default)]
    pub translated: String,
    #[serde(default)]
    pub stale: bool,
}

impl From<&TranslationSlot> for ExchangeRow {
    fn from(slot: &TranslationSlot) -> Self {
        Self {
            key: slot.key.to_string(),
            dialogue_id: slot.dialogue_id.clone(),
            original: slot.original_text.clone(),
            translated: slot.translated_text.clone().unwrap_or_default(),
            stale: slot.stale,
        }
    }
}

/// What an import did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub applied: usize,
    pub unchanged: usize,
    pub empty: usize,
    /// Rows whose original no longer matches the registry
    pub mismatched: usize,
    /// Rows with an unparsable or unregistered key
    pub unknown: usize,
}

/// Serialize registry rows, optionally only those of one file
pub fn export_rows<S: SlotStore>(registry: &SlotRegistry<S>, file_id: Option<&str>) -> Result<Vec<ExchangeRow>> {
    let slots = match file_id {
        Some(file_id) => registry.rows_for_file(file_id)?,
        None => registry.all_rows()?,
    };
    Ok(slots.iter().map(ExchangeRow::from).collect())
}

/// Write registry rows to a JSON file
pub fn export_to_file<S: SlotStore, P: AsRef<Path>>(
    registry: &SlotRegistry<S>,
    path: P,
    file_id: Option<&str>,
) -> Result<usize> {
    let rows = export_rows(registry, file_id)?;
    let json = serde_json::to_string_pretty(&rows).context("Failed to serialize rows")?;
    FileManager::write_to_file(&path, &json)?;
    info!("Exported {} rows to {:?}", rows.len(), path.as_ref());
    Ok(rows.len())
}

/// Apply edited rows to the registry
pub fn import_rows<S: SlotStore>(registry: &SlotRegistry<S>, rows: &[ExchangeRow]) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for row in rows {
        let translated = row.translated.trim();
        if translated.is_empty() {
            summary.empty += 1;
            continue;
        }

        let Ok(key) = row.key.parse::<SlotKey>() else {
            warn!("Skipping row with invalid key {}", row.key);
            summary.unknown += 1;
            continue;
        };
        let Some(slot) = registry.store().get(&key)? else {
            warn!("Skipping row for unregistered slot {}", row.key);
            summary.unknown += 1;
            continue;
        };

        if slot.original_text != row.original {
            warn!("Skipping {}: source text changed since export", row.key);
            summary.mismatched += 1;
            continue;
        }
        if slot.translation() == Some(translated) && !slot.stale {
            summary.unchanged += 1;
            continue;
        }

        registry.record_translation(&key, translated)?;
        summary.applied += 1;
    }

    info!(
        "Imported {} rows ({} unchanged, {} empty, {} mismatched, {} unknown)",
        summary.applied, summary.unchanged, summary.empty, summary.mismatched, summary.unknown
    );
    Ok(summary)
}

/// Read a JSON file of rows and apply it
pub fn import_from_file<S: SlotStore, P: AsRef<Path>>(registry: &SlotRegistry<S>, path: P) -> Result<ImportSummary> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read rows from {:?}", path))?;
    let rows: Vec<ExchangeRow> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse rows from {:?}", path))?;
    import_rows(registry, &rows)
}

/// Rows that need a human look before rebuilding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewReport {
    pub stale: Vec<ExchangeRow>,
    pub untranslated: Vec<ExchangeRow>,
}

impl ReviewReport {
    pub fn build<S: SlotStore>(registry: &SlotRegistry<S>) -> Result<Self> {
        let mut report = ReviewReport::default();
        for slot in registry.all_rows()? {
            if slot.stale {
                report.stale.push(ExchangeRow::from(&slot));
            } else if slot.is_pending() {
                report.untranslated.push(ExchangeRow::from(&slot));
            }
        }
        Ok(report)
    }

    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.untranslated.is_empty()
    }
}
