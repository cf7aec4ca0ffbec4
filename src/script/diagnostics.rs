/*!
 * Per-line diagnostics and per-file reports.
 *
 * No single line failure aborts a file: every notice raised while extracting or
 * rebuilding is collected into the `FileReport` of the file it belongs to.
 */

use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

/// A notice raised for a single line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Unbalanced link markup; the line is excluded from output
    MalformedTag { line_index: usize, tag: String },
    /// The source text changed after it was translated
    StaleTranslation {
        line_index: usize,
        key: String,
        previous_original: String,
    },
    /// Markers were placed approximately
    LossyReinsertion { line_index: usize, detail: String },
    /// An unrecognized angle-bracket run was kept literally
    UnknownTag { line_index: usize, tag: String },
    /// No translation is stored; the line is excluded from output
    MissingTranslation { line_index: usize, key: String },
    /// Source-script characters remain in the rebuilt line
    ResidualSourceScript { line_index: usize, sample: String },
}

impl Diagnostic {
    pub fn line_index(&self) -> usize {
        match self {
            Diagnostic::MalformedTag { line_index, .. }
            | Diagnostic::StaleTranslation { line_index, .. }
            | Diagnostic::LossyReinsertion { line_index, .. }
            | Diagnostic::UnknownTag { line_index, .. }
            | Diagnostic::MissingTranslation { line_index, .. }
            | Diagnostic::ResidualSourceScript { line_index, .. } => *line_index,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MalformedTag { .. } | Diagnostic::MissingTranslation { .. } => Severity::Error,
            Diagnostic::StaleTranslation { .. }
            | Diagnostic::LossyReinsertion { .. }
            | Diagnostic::ResidualSourceScript { .. } => Severity::Warning,
            Diagnostic::UnknownTag { .. } => Severity::Notice,
        }
    }

    /// Whether the line was left out of the rebuilt file
    pub fn excludes_line(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedTag { line_index, tag } => {
                write!(f, "line {}: malformed tag {}", line_index + 1, tag)
            }
            Diagnostic::StaleTranslation { line_index, key, .. } => {
                write!(f, "line {}: source changed since translation of {}", line_index + 1, key)
            }
            Diagnostic::LossyReinsertion { line_index, detail } => {
                write!(f, "line {}: inexact tag placement ({})", line_index + 1, detail)
            }
            Diagnostic::UnknownTag { line_index, tag } => {
                write!(f, "line {}: unknown tag {} kept as text", line_index + 1, tag)
            }
            Diagnostic::MissingTranslation { line_index, key } => {
                write!(f, "line {}: no translation for {}", line_index + 1, key)
            }
            Diagnostic::ResidualSourceScript { line_index, sample } => {
                write!(f, "line {}: untranslated characters remain: {}", line_index + 1, sample)
            }
        }
    }
}

/// Summary of one pass over one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_id: String,
    pub total_lines: usize,
    pub discarded_lines: usize,
    pub extracted_lines: usize,
    pub passthrough_lines: usize,
    pub written_lines: usize,
    pub slots_created: usize,
    pub slots_updated: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            ..Default::default()
        }
    }

    /// Record a diagnostic and log it
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Notice => info!("{}: {}", self.file_id, diagnostic),
            Severity::Warning | Severity::Error => warn!("{}: {}", self.file_id, diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity() == severity)
            .count()
    }

    pub fn excluded_lines(&self) -> usize {
        let mut lines: Vec<usize> = self
            .diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.excludes_line())
            .map(Diagnostic::line_index)
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines.len()
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn log_summary(&self, pass: &str) {
        info!(
            "{} {}: {} lines, {} extracted, {} discarded, {} written, {} slots created, {} updated, {} errors, {} warnings",
            pass,
            self.file_id,
            self.total_lines,
            self.extracted_lines,
            self.discarded_lines,
            self.written_lines,
            self.slots_created,
            self.slots_updated,
            self.count(Severity::Error),
            self.count(Severity::Warning)
        );
    }
}
