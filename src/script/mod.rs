/*!
 * Script line handling.
 *
 * This module contains everything that operates on a single line of a visual-novel
 * script file:
 * - `markup`: recognizes inline tags and their character offsets
 * - `classifier`: decides whether a line carries translatable dialogue
 * - `extractor`: produces clean text plus the tag layout that was stripped
 * - `reinsertion`: projects the tag layout onto translated text
 * - `rebuilder`: reassembles the final script line
 * - `diagnostics`: per-line notices collected into a per-file report
 */

pub mod classifier;
pub mod diagnostics;
pub mod extractor;
pub mod markup;
pub mod rebuilder;
pub mod reinsertion;

pub use classifier::LineClass;
pub use diagnostics::{Diagnostic, FileReport, Severity};
pub use extractor::{ExtractionRecord, Segment, TagLayout, TagMarker};
pub use markup::{TagKind, TagOccurrence, TokenizedLine, UnknownTag};
pub use rebuilder::{LineRebuilder, RebuiltLine};
pub use reinsertion::{ClauseSegmenter, PhraseAnchor, ReinsertionEngine, ReinsertionStyle, SegmentationStrategy};

/// A single line read from a script file
///
/// Lines are immutable once read. The raw text never contains the line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// The raw text of the line without its terminator
    pub raw_text: String,
    /// Zero-based index of the line within its file
    pub line_index: usize,
}

impl ScriptLine {
    /// Create a new script line
    pub fn new(raw_text: impl Into<String>, line_index: usize) -> Self {
        Self {
            raw_text: raw_text.into(),
            line_index,
        }
    }

    /// Split file content into script lines
    ///
    /// A leading byte order mark is ignored and both `\n` and `\r\n` endings are accepted.
    pub fn parse_content(content: &str) -> Vec<ScriptLine> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        content
            .lines()
            .enumerate()
            .map(|(index, line)| ScriptLine::new(line, index))
            .collect()
    }
}
