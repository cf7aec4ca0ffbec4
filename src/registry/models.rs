/*!
 * Registry entity models.
 *
 * These structures map directly to the `slots` table and are also the rows
 * exchanged with the hand-editing surface.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::RegistryError;

/// What a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// The clean text of a whole line
    Line,
    /// The phrase wrapped by the n-th link of a line
    LinkPhrase,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Line => write!(f, "line"),
            SlotKind::LinkPhrase => write!(f, "link_phrase"),
        }
    }
}

impl std::str::FromStr for SlotKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(SlotKind::Line),
            "link_phrase" => Ok(SlotKind::LinkPhrase),
            _ => Err(anyhow::anyhow!("Invalid slot kind: {}", s)),
        }
    }
}

/// Stable identity of a translation slot
///
/// Derived purely from the file id and the zero-based line index, plus the link
/// ordinal for link phrases. Rendered as `file#line` or `file#line/linkN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub file_id: String,
    pub line_index: usize,
    pub link_ordinal: Option<usize>,
}

impl SlotKey {
    pub fn line(file_id: impl Into<String>, line_index: usize) -> Self {
        Self {
            file_id: file_id.into(),
            line_index,
            link_ordinal: None,
        }
    }

    pub fn link(file_id: impl Into<String>, line_index: usize, ordinal: usize) -> Self {
        Self {
            file_id: file_id.into(),
            line_index,
            link_ordinal: Some(ordinal),
        }
    }

    pub fn kind(&self) -> SlotKind {
        match self.link_ordinal {
            Some(_) => SlotKind::LinkPhrase,
            None => SlotKind::Line,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.link_ordinal {
            Some(ordinal) => write!(f, "{}#{}/link{}", self.file_id, self.line_index, ordinal),
            None => write!(f, "{}#{}", self.file_id, self.line_index),
        }
    }
}

impl std::str::FromStr for SlotKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidKey(s.to_string());

        let (file_id, position) = s.rsplit_once('#').ok_or_else(invalid)?;
        if file_id.is_empty() {
            return Err(invalid());
        }

        let (line, ordinal) = match position.split_once("/link") {
            Some((line, ordinal)) => (line, Some(ordinal.parse::<usize>().map_err(|_| invalid())?)),
            None => (position, None),
        };
        let line_index = line.parse::<usize>().map_err(|_| invalid())?;

        Ok(Self {
            file_id: file_id.to_string(),
            line_index,
            link_ordinal: ordinal,
        })
    }
}

/// A persisted `(key, original, translated)` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSlot {
    pub key: SlotKey,
    /// Identifier from the line's payload marker
    pub dialogue_id: Option<String>,
    pub original_text: String,
    /// SHA-256 of `original_text`, used for change detection
    pub original_hash: String,
    pub translated_text: Option<String>,
    /// Set when the original changed after a translation was stored
    pub stale: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TranslationSlot {
    /// Create an untranslated slot
    pub fn new(key: SlotKey, dialogue_id: Option<String>, original_text: impl Into<String>) -> Self {
        let original_text = original_text.into();
        let now = chrono::Utc::now().to_rfc3339();

        Self {
            key,
            dialogue_id,
            original_hash: hash_text(&original_text),
            original_text,
            translated_text: None,
            stale: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The stored translation, ignoring blank values
    pub fn translation(&self) -> Option<&str> {
        self.translated_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_translated(&self) -> bool {
        self.translation().is_some()
    }

    /// Whether the slot still needs a machine or human translation
    pub fn is_pending(&self) -> bool {
        !self.is_translated() && !self.original_text.trim().is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Aggregate counts over the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub translated: usize,
    pub pending: usize,
    pub stale: usize,
}

/// Hex SHA-256 of a text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
