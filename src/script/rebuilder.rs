/*!
 * Line reassembly.
 */

use super::classifier::LineClass;
use super::extractor::ExtractionRecord;
use super::reinsertion::{normalize_translation, ReinsertionEngine};
use crate::errors::ScriptError;

/// A rebuilt output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltLine {
    pub text: String,
    /// Body of the line without prefix and suffix
    pub body: String,
    pub lossy: bool,
    pub notes: Vec<String>,
}

/// Reassembles script lines from extraction records and translations
#[derive(Debug, Default)]
pub struct LineRebuilder {
    engine: ReinsertionEngine,
}

impl LineRebuilder {
    pub fn new(engine: ReinsertionEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ReinsertionEngine {
        &self.engine
    }

    /// Rebuild a line; discarded lines yield `None` and are not emitted
    pub fn rebuild(
        &self,
        record: &ExtractionRecord,
        translated: &str,
        link_translations: &[String],
    ) -> Result<Option<RebuiltLine>, ScriptError> {
        let (body, lossy, notes) = match record.classification {
            LineClass::Discard => return Ok(None),
            LineClass::StandardContent => (normalize_translation(translated), false, Vec::new()),
            LineClass::StructuredContent => {
                let outcome = self
                    .engine
                    .reinsert(&record.tag_layout, translated, link_translations)?;
                (outcome.text, outcome.lossy, outcome.notes)
            }
        };

        Ok(Some(RebuiltLine {
            text: format!("{}{}{}", record.structural_prefix, body, record.structural_suffix),
            body,
            lossy,
            notes,
        }))
    }
}
