/*!
 * Line classification.
 *
 * Decides whether a script line is discarded, carries plain dialogue, or carries
 * structured debate content whose inline markup must survive translation.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::markup;

/// Literal marking a structured debate line
pub const STRUCTURED_MARKER: &str = "@printDebate pos:";

/// Leading character of directive and metadata lines
pub const DISCARD_MARKER: char = '>';

// Dialogue payload marker such as `|#0101Adv02_Ema001|`
static PAYLOAD_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|#([^|\s]+)\|").expect("Invalid payload marker regex")
});

/// Classification of a script line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineClass {
    /// No translatable content; the line is dropped from the output
    Discard,
    /// Dialogue whose markup is flattened away
    StandardContent,
    /// Debate dialogue whose line breaks and links are preserved
    StructuredContent,
}

impl fmt::Display for LineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineClass::Discard => write!(f, "discard"),
            LineClass::StandardContent => write!(f, "standard"),
            LineClass::StructuredContent => write!(f, "structured"),
        }
    }
}

/// Location of the payload marker inside a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadMarker {
    /// Identifier between `|#` and `|`
    pub dialogue_id: String,
    /// Byte offset where the marker starts
    pub start: usize,
    /// Byte offset just past the marker
    pub end: usize,
}

/// Find the first payload marker in a line
pub fn find_payload_marker(raw: &str) -> Option<PayloadMarker> {
    let captures = PAYLOAD_MARKER.captures(raw)?;
    let whole = captures.get(0)?;
    let id = captures.get(1)?;

    Some(PayloadMarker {
        dialogue_id: id.as_str().to_string(),
        start: whole.start(),
        end: whole.end(),
    })
}

/// Classify a raw script line
pub fn classify(raw: &str) -> LineClass {
    // Structured detection wins over the discard marker
    if raw.contains(STRUCTURED_MARKER) {
        return LineClass::StructuredContent;
    }

    let payload = find_payload_marker(raw);
    let has_dialogue = payload
        .as_ref()
        .map(|marker| !markup::tokenize(&raw[marker.end..]).plain_text().trim().is_empty())
        .unwrap_or(false);

    let trimmed = raw.trim_start();
    if let Some(body) = trimmed.strip_prefix(DISCARD_MARKER) {
        if body.trim_start().starts_with('@') || !has_dialogue {
            return LineClass::Discard;
        }
    }

    if has_dialogue {
        LineClass::StandardContent
    } else {
        LineClass::Discard
    }
}
