/*!
 * Clean-text extraction.
 *
 * Splits a classified line into its structural prefix, its translatable body and its
 * trailing whitespace, then flattens the body into clean text while recording the tag
 * layout needed to rebuild it later.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::{self, LineClass};
use super::markup::{self, TagKind, Token, UnknownTag};
use super::ScriptLine;
use crate::errors::ScriptError;

// Structured lines without a payload marker end their prefix after the position field
static STRUCTURED_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@printDebate pos:\S*\s*").expect("Invalid structured prefix regex")
});

/// A marker recorded in place of stripped markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMarker {
    LineBreak,
    /// A link with its identifier and the text it wrapped
    Link { attribute: String, text: String },
}

/// One element of a tag layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Marker(TagMarker),
}

/// Piece of a visual line between two line breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    Text(String),
    Link { attribute: String, text: String },
}

/// Text between two line break markers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualLine {
    pub items: Vec<LineItem>,
}

impl VisualLine {
    /// Concatenated text of the line, link phrases included
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|item| match item {
                LineItem::Text(text) => text.as_str(),
                LineItem::Link { text, .. } => text.as_str(),
            })
            .collect()
    }

    /// Links in this line in source order
    pub fn links(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .filter_map(|item| match item {
                LineItem::Link { attribute, text } => Some((attribute.as_str(), text.as_str())),
                LineItem::Text(_) => None,
            })
            .collect()
    }

    /// Whether the line begins with a link (ignoring leading whitespace)
    pub fn starts_with_link(&self) -> bool {
        for item in &self.items {
            match item {
                LineItem::Text(text) if text.trim().is_empty() => continue,
                LineItem::Text(_) => return false,
                LineItem::Link { .. } => return true,
            }
        }
        false
    }
}

/// Ordered record of the markup stripped from a line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagLayout {
    segments: Vec<Segment>,
}

impl TagLayout {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A layout holding only clean text
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self::new(vec![Segment::Text(text)])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Concatenation of all text spans, link text included
    pub fn clean_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text(text) => Some(text.as_str()),
                Segment::Marker(TagMarker::Link { text, .. }) => Some(text.as_str()),
                Segment::Marker(TagMarker::LineBreak) => None,
            })
            .collect()
    }

    pub fn markers(&self) -> impl Iterator<Item = &TagMarker> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Marker(marker) => Some(marker),
            Segment::Text(_) => None,
        })
    }

    pub fn line_break_count(&self) -> usize {
        self.markers().filter(|m| matches!(m, TagMarker::LineBreak)).count()
    }

    pub fn link_count(&self) -> usize {
        self.markers().filter(|m| matches!(m, TagMarker::Link { .. })).count()
    }

    pub fn has_markers(&self) -> bool {
        self.markers().next().is_some()
    }

    /// Marker sequence expressed as tag kinds, a link counting as an open/close pair
    pub fn marker_kinds(&self) -> Vec<TagKind> {
        let mut kinds = Vec::new();
        for marker in self.markers() {
            match marker {
                TagMarker::LineBreak => kinds.push(TagKind::LineBreak),
                TagMarker::Link { .. } => {
                    kinds.push(TagKind::LinkOpen);
                    kinds.push(TagKind::LinkClose);
                }
            }
        }
        kinds
    }

    /// Link identifiers and phrases in source order
    pub fn links(&self) -> Vec<(&str, &str)> {
        self.markers()
            .filter_map(|marker| match marker {
                TagMarker::Link { attribute, text } => Some((attribute.as_str(), text.as_str())),
                TagMarker::LineBreak => None,
            })
            .collect()
    }

    /// Split the layout at every line break
    pub fn visual_lines(&self) -> Vec<VisualLine> {
        let mut lines = vec![VisualLine::default()];

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => {
                    if let Some(line) = lines.last_mut() {
                        line.items.push(LineItem::Text(text.clone()));
                    }
                }
                Segment::Marker(TagMarker::Link { attribute, text }) => {
                    if let Some(line) = lines.last_mut() {
                        line.items.push(LineItem::Link {
                            attribute: attribute.clone(),
                            text: text.clone(),
                        });
                    }
                }
                Segment::Marker(TagMarker::LineBreak) => lines.push(VisualLine::default()),
            }
        }

        lines
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }
}

/// Everything extracted from one translatable line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    pub line_index: usize,
    pub classification: LineClass,
    /// Identifier from the payload marker, if the line has one
    pub dialogue_id: Option<String>,
    pub clean_text: String,
    pub tag_layout: TagLayout,
    pub structural_prefix: String,
    pub structural_suffix: String,
    pub unknown_tags: Vec<UnknownTag>,
}

impl ExtractionRecord {
    /// Lines whose body holds no text are copied through unchanged and get no slot
    pub fn is_passthrough(&self) -> bool {
        self.clean_text.trim().is_empty()
    }
}

/// Extract clean text and tag layout from a script line
///
/// Returns `Ok(None)` for discarded lines.
pub fn extract(line: &ScriptLine) -> Result<Option<ExtractionRecord>, ScriptError> {
    let raw = line.raw_text.as_str();
    let classification = classifier::classify(raw);
    if classification == LineClass::Discard {
        debug!("Line {} discarded", line.line_index);
        return Ok(None);
    }

    let payload = classifier::find_payload_marker(raw);
    let marker_end = match (&payload, classification) {
        (Some(marker), _) => marker.end,
        (None, LineClass::StructuredContent) => STRUCTURED_PREFIX
            .find(raw)
            .map(|m| m.end())
            .unwrap_or(0),
        (None, _) => 0,
    };

    let after_marker = &raw[marker_end..];
    let body_start = marker_end + (after_marker.len() - after_marker.trim_start().len());
    let rest = &raw[body_start..];
    let body = rest.trim_end();

    let structural_prefix = raw[..body_start].to_string();
    let structural_suffix = rest[body.len()..].to_string();
    let base_offset = structural_prefix.chars().count();

    let tokenized = markup::tokenize_at(body, base_offset);

    let tag_layout = match classification {
        LineClass::StructuredContent => build_structured_layout(&tokenized.tokens, line.line_index)?,
        _ => TagLayout::plain(tokenized.plain_text()),
    };

    Ok(Some(ExtractionRecord {
        line_index: line.line_index,
        classification,
        dialogue_id: payload.map(|marker| marker.dialogue_id),
        clean_text: tag_layout.clean_text(),
        tag_layout,
        structural_prefix,
        structural_suffix,
        unknown_tags: tokenized.unknown_tags,
    }))
}

fn build_structured_layout(tokens: &[Token], line_index: usize) -> Result<TagLayout, ScriptError> {
    let mut layout = TagLayout::default();
    // (attribute, text, opening tag source)
    let mut open_link: Option<(String, String, String)> = None;

    let malformed = |tag: &str| ScriptError::MalformedTag {
        line_index,
        tag: tag.to_string(),
    };

    for token in tokens {
        match token {
            Token::Text(text) => match open_link.as_mut() {
                Some((_, link_text, _)) => link_text.push_str(text),
                None => layout.push_text(text),
            },
            Token::Tag(tag) => match tag.kind {
                TagKind::LineBreak => {
                    if open_link.is_some() {
                        return Err(malformed(&tag.source));
                    }
                    layout.segments.push(Segment::Marker(TagMarker::LineBreak));
                }
                TagKind::LinkOpen => {
                    if open_link.is_some() {
                        return Err(malformed(&tag.source));
                    }
                    let attribute = tag.attribute.clone().unwrap_or_default();
                    open_link = Some((attribute, String::new(), tag.source.clone()));
                }
                TagKind::LinkClose => {
                    let (attribute, text, _) = open_link.take().ok_or_else(|| malformed(&tag.source))?;
                    layout
                        .segments
                        .push(Segment::Marker(TagMarker::Link { attribute, text }));
                }
            },
        }
    }

    if let Some((_, _, source)) = open_link {
        return Err(malformed(&source));
    }

    Ok(layout)
}
