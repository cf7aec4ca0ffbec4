/*!
 * Rebuild pass: script content plus stored translations in, localized content out.
 *
 * Discarded lines are dropped. Lines that cannot be rebuilt (malformed markup, a
 * missing translation, or a translation made for different source text) are left
 * out and reported; nothing is ever substituted for a missing translation.
 */

use log::{debug, warn};

use super::extract_pass::push_unknown_tags;
use crate::errors::{RegistryError, ScriptError};
use crate::registry::{SlotKey, SlotRegistry, SlotStore, SourceLookup};
use crate::script::extractor::{self, ExtractionRecord};
use crate::script::{Diagnostic, FileReport, LineRebuilder, ScriptLine};
use crate::validation::ValidationService;

/// Rebuilt file content and its report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutput {
    pub content: String,
    pub report: FileReport,
}

/// Rebuild one file from its source content and the registry
pub fn rebuild_file<S: SlotStore>(
    file_id: &str,
    content: &str,
    registry: &SlotRegistry<S>,
    rebuilder: &LineRebuilder,
    validator: &ValidationService,
) -> Result<RebuildOutput, RegistryError> {
    let mut report = FileReport::new(file_id);
    let lines = ScriptLine::parse_content(content);
    report.total_lines = lines.len();

    let mut output: Vec<String> = Vec::with_capacity(lines.len());

    for line in &lines {
        let record = match extractor::extract(line) {
            Ok(Some(record)) => record,
            Ok(None) => {
                report.discarded_lines += 1;
                continue;
            }
            Err(ScriptError::MalformedTag { line_index, tag }) => {
                report.push(Diagnostic::MalformedTag { line_index, tag });
                continue;
            }
            Err(other) => {
                debug!("Line {} of {} skipped: {}", line.line_index, file_id, other);
                continue;
            }
        };

        push_unknown_tags(&mut report, &record);

        if record.is_passthrough() {
            report.passthrough_lines += 1;
            output.push(line.raw_text.clone());
            continue;
        }

        report.extracted_lines += 1;
        if let Some(text) = rebuild_record(file_id, &record, registry, rebuilder, validator, &mut report)? {
            output.push(text);
        }
    }

    report.written_lines = output.len();
    report.log_summary("Rebuilt");

    let mut content = output.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    Ok(RebuildOutput { content, report })
}

fn rebuild_record<S: SlotStore>(
    file_id: &str,
    record: &ExtractionRecord,
    registry: &SlotRegistry<S>,
    rebuilder: &LineRebuilder,
    validator: &ValidationService,
    report: &mut FileReport,
) -> Result<Option<String>, RegistryError> {
    let line_key = SlotKey::line(file_id, record.line_index);
    let Some(translated) = current_translation(registry, line_key, &record.clean_text, record.line_index, report)?
    else {
        return Ok(None);
    };

    let mut link_translations = Vec::with_capacity(record.tag_layout.link_count());
    for (ordinal, (_, phrase)) in record.tag_layout.links().into_iter().enumerate() {
        let link_key = SlotKey::link(file_id, record.line_index, ordinal);
        match current_translation(registry, link_key, phrase, record.line_index, report)? {
            Some(translated_phrase) => link_translations.push(translated_phrase),
            None => return Ok(None),
        }
    }

    let rebuilt = match rebuilder.rebuild(record, &translated, &link_translations) {
        Ok(Some(rebuilt)) => rebuilt,
        Ok(None) => return Ok(None),
        Err(error) => {
            debug!("Line {} of {} not rebuilt: {}", record.line_index, file_id, error);
            report.push(Diagnostic::LossyReinsertion {
                line_index: record.line_index,
                detail: error.to_string(),
            });
            return Ok(None);
        }
    };

    for note in &rebuilt.notes {
        report.push(Diagnostic::LossyReinsertion {
            line_index: record.line_index,
            detail: note.clone(),
        });
    }
    for diagnostic in validator.validate_line(record, &rebuilt.body) {
        report.push(diagnostic);
    }

    Ok(Some(rebuilt.text))
}

/// Stored translation for `source_text`, reporting why the line is left out when there is none
///
/// A translation made for different source text (the script was edited without a new
/// extraction) is never written.
fn current_translation<S: SlotStore>(
    registry: &SlotRegistry<S>,
    key: SlotKey,
    source_text: &str,
    line_index: usize,
    report: &mut FileReport,
) -> Result<Option<String>, RegistryError> {
    match registry.lookup_for_source(&key, source_text)? {
        SourceLookup::Current(translated) => Ok(Some(translated)),
        SourceLookup::Missing => {
            report.push(Diagnostic::MissingTranslation {
                line_index,
                key: key.to_string(),
            });
            Ok(None)
        }
        SourceLookup::Outdated { stored_original } => {
            warn!("Source of {} changed since extraction, run extract before building", key);
            report.push(Diagnostic::StaleTranslation {
                line_index,
                key: key.to_string(),
                previous_original: stored_original,
            });
            report.push(Diagnostic::MissingTranslation {
                line_index,
                key: key.to_string(),
            });
            Ok(None)
        }
    }
}
