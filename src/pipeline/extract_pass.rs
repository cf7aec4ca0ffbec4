/*!
 * Extraction pass: script content in, registered slots and a report out.
 */

use log::debug;

use crate::errors::{RegistryError, ScriptError};
use crate::registry::{SlotChange, SlotKey, SlotOutcome, SlotRegistry, SlotStore};
use crate::script::extractor::{self, ExtractionRecord};
use crate::script::{Diagnostic, FileReport, ScriptLine};

/// Extract every line of a file and register its slots
///
/// Line-level problems become diagnostics in the returned report. Only a
/// storage failure aborts the file.
pub fn extract_file<S: SlotStore>(
    file_id: &str,
    content: &str,
    registry: &SlotRegistry<S>,
) -> Result<FileReport, RegistryError> {
    let mut report = FileReport::new(file_id);
    let lines = ScriptLine::parse_content(content);
    report.total_lines = lines.len();

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
            continue;
        }

        report.extracted_lines += 1;
        register_record(file_id, &record, registry, &mut report)?;
    }

    report.log_summary("Extracted");
    Ok(report)
}

/// Diagnostics for unrecognized tags kept as literal text
pub(crate) fn push_unknown_tags(report: &mut FileReport, record: &ExtractionRecord) {
    for tag in &record.unknown_tags {
        report.push(Diagnostic::UnknownTag {
            line_index: record.line_index,
            tag: tag.text.clone(),
        });
    }
}

fn register_record<S: SlotStore>(
    file_id: &str,
    record: &ExtractionRecord,
    registry: &SlotRegistry<S>,
    report: &mut FileReport,
) -> Result<(), RegistryError> {
    let dialogue_id = record.dialogue_id.as_deref();

    let outcome = registry.register(
        SlotKey::line(file_id, record.line_index),
        dialogue_id,
        &record.clean_text,
    )?;
    tally(report, record.line_index, outcome);

    for (ordinal, (_, phrase)) in record.tag_layout.links().into_iter().enumerate() {
        let outcome = registry.register(SlotKey::link(file_id, record.line_index, ordinal), dialogue_id, phrase)?;
        tally(report, record.line_index, outcome);
    }

    Ok(())
}

fn tally(report: &mut FileReport, line_index: usize, outcome: SlotOutcome) {
    if outcome.is_stale_warning() {
        report.push(Diagnostic::StaleTranslation {
            line_index,
            key: outcome.slot.key.to_string(),
            previous_original: match &outcome.change {
                SlotChange::Updated { previous_original, .. } => previous_original.clone(),
                _ => String::new(),
            },
        });
    }

    match outcome.change {
        SlotChange::Created => report.slots_created += 1,
        SlotChange::Updated { .. } => report.slots_updated += 1,
        SlotChange::Unchanged => {}
    }
}
