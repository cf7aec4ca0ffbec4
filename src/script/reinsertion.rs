/*!
 * Tag reinsertion.
 *
 * Projects a source tag layout onto translated text. Translated link phrases are located
 * first, the flat text is then cut into one chunk per visual line by a pluggable
 * segmentation strategy that keeps each phrase inside its own line, links are placed back
 * where their phrase sits, and the decorative size wrapper is emitted at the start of
 * every visual line.
 *
 * Reinsertion is best effort: inexact placement is reported, never fatal. The output always
 * carries exactly as many line breaks and link constructs as the source layout.
 */

use log::debug;

use super::extractor::{LineItem, TagLayout, VisualLine};
use crate::errors::ScriptError;

const LINE_BREAK: &str = "<br>";

/// Result of cutting text into visual-line chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub chunks: Vec<String>,
    /// False when a cut had to be made inside a run of non-space text
    pub exact: bool,
}

/// Character range of a translated link phrase and the chunk that must hold it
///
/// Offsets count characters of the trimmed text handed to the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseAnchor {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

/// Strategy that splits translated text into a fixed number of chunks
pub trait SegmentationStrategy: Send + Sync {
    /// Split `text` into `weights.len()` chunks
    ///
    /// `weights` are the relative sizes of the source visual lines and guide where cuts go.
    fn partition(&self, text: &str, weights: &[usize]) -> Partition;

    /// Split `text` so that every anchored phrase lies whole inside its own chunk
    ///
    /// Strategies that ignore anchors still work: the engine then moves misplaced
    /// phrases back into their line and reports the placement as lossy.
    fn partition_anchored(&self, text: &str, weights: &[usize], anchors: &[PhraseAnchor]) -> Partition {
        let _ = anchors;
        self.partition(text, weights)
    }
}

/// Default segmentation: cut after clause or sentence punctuation closest to the
/// proportional positions, falling back to word starts, then to arbitrary characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseSegmenter;

// Punctuation after which a visual line may end
fn is_break_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | '!' | '?' | '。' | '！' | '？' | '…' | '‥' | ',' | '、' | '，' | ';' | '；' | ':' | '：'
    )
}

// Closing quotes and brackets that stay attached to the punctuation before them
fn is_closer(c: char) -> bool {
    matches!(
        c,
        '」' | '』' | ')' | '）' | '"' | '”' | '’' | '\'' | '】' | '》' | ']'
    )
}

/// Cut penalty tier of position `p` (a cut before `chars[p]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryTier {
    Clause,
    Word,
    Inside,
}

fn boundary_tier(chars: &[char], p: usize) -> BoundaryTier {
    let next = chars[p];
    let prev = chars[p - 1];

    if !is_break_punctuation(next) && !is_closer(next) {
        let mut q = p;
        while q > 0 && is_closer(chars[q - 1]) {
            q -= 1;
        }
        if q > 0 && is_break_punctuation(chars[q - 1]) {
            let punct = chars[q - 1];
            let decimal = (punct == '.' || punct == ',')
                && q == p
                && q >= 2
                && chars[q - 2].is_ascii_digit()
                && next.is_ascii_digit();
            if !decimal {
                return BoundaryTier::Clause;
            }
        }
    }

    if prev.is_whitespace() && !next.is_whitespace() {
        return BoundaryTier::Word;
    }

    BoundaryTier::Inside
}

/// Cumulative proportional cut targets for `cuts` cuts over `len` characters
fn proportional_targets(weights: &[usize], len: usize) -> Vec<usize> {
    let weights: Vec<usize> = weights.iter().map(|w| (*w).max(1)).collect();
    let total: usize = weights.iter().sum();
    let mut targets = Vec::with_capacity(weights.len().saturating_sub(1));
    let mut cumulative = 0;

    for weight in &weights[..weights.len() - 1] {
        cumulative += weight;
        targets.push((len * cumulative + total / 2) / total);
    }

    targets
}

// Whether cut `k` may sit before `chars[p]` without pulling an anchored phrase out of its chunk
fn cut_allowed(anchors: &[PhraseAnchor], k: usize, p: usize) -> bool {
    anchors.iter().all(|anchor| {
        let splits_phrase = anchor.start < p && p < anchor.end;
        let opens_too_late = anchor.line > 0 && k == anchor.line - 1 && p > anchor.start;
        let closes_too_early = k == anchor.line && p < anchor.end;
        !splits_phrase && !opens_too_late && !closes_too_early
    })
}

impl SegmentationStrategy for ClauseSegmenter {
    fn partition(&self, text: &str, weights: &[usize]) -> Partition {
        self.partition_anchored(text, weights, &[])
    }

    fn partition_anchored(&self, text: &str, weights: &[usize], anchors: &[PhraseAnchor]) -> Partition {
        let text = text.trim();
        let chunk_count = weights.len().max(1);
        if chunk_count == 1 {
            return Partition {
                chunks: vec![text.to_string()],
                exact: true,
            };
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let cuts = chunk_count - 1;

        // Not enough characters for non-empty chunks: one character each, rest empty
        if len < chunk_count {
            let mut chunks: Vec<String> = chars.iter().map(|c| c.to_string()).collect();
            chunks.resize(chunk_count, String::new());
            return Partition { chunks, exact: false };
        }

        let targets = proportional_targets(weights, len);
        let word_penalty = (cuts + 1) * (len + 1);
        let inside_penalty = (cuts + 1) * (word_penalty + len + 1);

        let penalty = |p: usize| match boundary_tier(&chars, p) {
            BoundaryTier::Clause => 0,
            BoundaryTier::Word => word_penalty,
            BoundaryTier::Inside => inside_penalty,
        };

        // best[k][p]: minimal cost with cut k placed before chars[p]
        let positions = len; // valid cut positions are 1..len
        let mut best = vec![vec![usize::MAX; positions]; cuts];
        let mut from = vec![vec![0usize; positions]; cuts];

        for p in 1..positions {
            if cut_allowed(anchors, 0, p) {
                best[0][p] = penalty(p) + p.abs_diff(targets[0]);
            }
        }

        for k in 1..cuts {
            let mut running_min = usize::MAX;
            let mut running_arg = 0;
            for p in 1..positions {
                let q = p - 1;
                if q >= 1 && best[k - 1][q] < running_min {
                    running_min = best[k - 1][q];
                    running_arg = q;
                }
                if running_min != usize::MAX && cut_allowed(anchors, k, p) {
                    best[k][p] = running_min + penalty(p) + p.abs_diff(targets[k]);
                    from[k][p] = running_arg;
                }
            }
        }

        let mut last = 0;
        let mut last_cost = usize::MAX;
        for p in 1..positions {
            if best[cuts - 1][p] < last_cost {
                last_cost = best[cuts - 1][p];
                last = p;
            }
        }

        if last_cost == usize::MAX {
            // Anchors that cannot all be honored are dropped; the engine repairs placement
            debug!("No cut layout satisfies {} phrase anchors, ignoring them", anchors.len());
            return self.partition_anchored(text, weights, &[]);
        }

        let mut boundaries = vec![0usize; cuts];
        boundaries[cuts - 1] = last;
        for k in (1..cuts).rev() {
            boundaries[k - 1] = from[k][boundaries[k]];
        }

        let exact = boundaries
            .iter()
            .all(|p| boundary_tier(&chars, *p) != BoundaryTier::Inside);

        let mut chunks = Vec::with_capacity(chunk_count);
        let mut start = 0;
        for boundary in boundaries.iter().copied().chain(std::iter::once(len)) {
            let chunk: String = chars[start..boundary].iter().collect();
            chunks.push(chunk.trim().to_string());
            start = boundary;
        }

        let exact = exact && chunks.iter().all(|chunk| !chunk.is_empty());
        Partition { chunks, exact }
    }
}

/// Decorative markup emitted around reinserted content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinsertionStyle {
    /// Emitted at the start of the output and after every line break
    pub size_wrapper: String,
    /// Emitted inside each link, before the phrase
    pub link_style_open: String,
    /// Emitted inside each link, after the phrase
    pub link_style_close: String,
}

impl Default for ReinsertionStyle {
    fn default() -> Self {
        Self {
            size_wrapper: "<size=90%>".to_string(),
            link_style_open: "<color=#F2B035>".to_string(),
            link_style_close: "</color>".to_string(),
        }
    }
}

impl ReinsertionStyle {
    fn link(&self, attribute: &str, phrase: &str) -> String {
        format!(
            "<link=\"{}\">{}{}{}</link>",
            attribute, self.link_style_open, phrase, self.link_style_close
        )
    }
}

/// Tagged text produced by reinsertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinsertionOutcome {
    pub text: String,
    /// Whether any marker had to be placed approximately
    pub lossy: bool,
    /// Human readable reasons for lossy placement
    pub notes: Vec<String>,
}

/// Rebuilds tagged text from a layout and its translation
pub struct ReinsertionEngine {
    strategy: Box<dyn SegmentationStrategy>,
    style: ReinsertionStyle,
}

impl std::fmt::Debug for ReinsertionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReinsertionEngine")
            .field("style", &self.style)
            .finish()
    }
}

impl Default for ReinsertionEngine {
    fn default() -> Self {
        Self::new(ReinsertionStyle::default())
    }
}

impl ReinsertionEngine {
    /// Engine with the default clause segmenter
    pub fn new(style: ReinsertionStyle) -> Self {
        Self::with_strategy(style, Box::new(ClauseSegmenter))
    }

    pub fn with_strategy(style: ReinsertionStyle, strategy: Box<dyn SegmentationStrategy>) -> Self {
        Self { strategy, style }
    }

    pub fn style(&self) -> &ReinsertionStyle {
        &self.style
    }

    /// Reinsert the layout's markers into translated text
    ///
    /// `link_translations` holds one translated phrase per link in layout order.
    pub fn reinsert(
        &self,
        layout: &TagLayout,
        translated: &str,
        link_translations: &[String],
    ) -> Result<ReinsertionOutcome, ScriptError> {
        if link_translations.len() != layout.link_count() {
            return Err(ScriptError::LinkCountMismatch {
                expected: layout.link_count(),
                found: link_translations.len(),
            });
        }

        let translated = normalize_translation(translated);
        let visual_lines = layout.visual_lines();

        if translated == layout.clean_text() {
            debug!("Translation matches source text, reusing original spans");
            return Ok(self.reinsert_identity(&visual_lines, link_translations));
        }

        let weights: Vec<usize> = visual_lines
            .iter()
            .map(|line| line.text().chars().count())
            .collect();
        let link_lines: Vec<usize> = visual_lines
            .iter()
            .enumerate()
            .flat_map(|(index, line)| std::iter::repeat_n(index, line.links().len()))
            .collect();
        let anchors = anchor_phrases(&translated, &link_lines, link_translations);

        let partition = self
            .strategy
            .partition_anchored(&translated, &weights, &anchors);

        let mut lossy = !partition.exact;
        let mut notes = Vec::new();
        if !partition.exact {
            notes.push("line break placed inside a word".to_string());
        }

        let mut chunks = partition.chunks;
        for moved_from in recover_drifted_phrases(&mut chunks, &link_lines, link_translations) {
            lossy = true;
            notes.push(format!(
                "link phrase moved out of visual line {}",
                moved_from + 1
            ));
        }

        let mut rendered = Vec::with_capacity(visual_lines.len());
        let mut link_index = 0;
        for (line, chunk) in visual_lines.iter().zip(chunks.iter()) {
            let links: Vec<(&str, &str)> = line
                .links()
                .iter()
                .map(|(attribute, _)| {
                    let phrase = link_translations[link_index].as_str();
                    link_index += 1;
                    (*attribute, phrase)
                })
                .collect();

            let (text, exact) = self.place_links(chunk, &links, line.starts_with_link());
            if !exact {
                lossy = true;
                notes.push(format!(
                    "link phrase not found in visual line {}",
                    rendered.len() + 1
                ));
            }
            rendered.push(text);
        }

        Ok(ReinsertionOutcome {
            text: self.join_lines(&rendered),
            lossy,
            notes,
        })
    }

    fn reinsert_identity(&self, lines: &[VisualLine], link_translations: &[String]) -> ReinsertionOutcome {
        let mut link_index = 0;
        let rendered: Vec<String> = lines
            .iter()
            .map(|line| {
                let mut out = String::new();
                for item in &line.items {
                    match item {
                        LineItem::Text(text) => out.push_str(text),
                        LineItem::Link { attribute, .. } => {
                            out.push_str(&self.style.link(attribute, &link_translations[link_index]));
                            link_index += 1;
                        }
                    }
                }
                out
            })
            .collect();

        ReinsertionOutcome {
            text: self.join_lines(&rendered),
            lossy: false,
            notes: Vec::new(),
        }
    }

    /// Place link constructs into one chunk; returns the text and whether every phrase was found
    fn place_links(&self, chunk: &str, links: &[(&str, &str)], leading: bool) -> (String, bool) {
        let mut out = String::new();
        let mut cursor = 0;
        let mut prepended: Option<String> = None;
        let mut appended: Vec<String> = Vec::new();
        let mut exact = true;

        for (index, (attribute, phrase)) in links.iter().enumerate() {
            if exact {
                if let Some((start, end)) = find_case_insensitive(&chunk[cursor..], phrase) {
                    out.push_str(&chunk[cursor..cursor + start]);
                    out.push_str(&self.style.link(attribute, &chunk[cursor + start..cursor + end]));
                    cursor += end;
                    continue;
                }
                exact = false;
                if index == 0 && leading {
                    prepended = Some(self.style.link(attribute, phrase));
                    continue;
                }
            }
            // Once a phrase is missing, the rest are appended in order
            appended.push(self.style.link(attribute, phrase));
        }
        out.push_str(&chunk[cursor..]);

        let separator = if chunk.chars().any(char::is_whitespace) { " " } else { "" };

        if let Some(link) = prepended {
            out = if out.is_empty() {
                link
            } else {
                format!("{}{}{}", link, separator, out)
            };
        }
        for link in appended {
            if !out.is_empty() {
                out.push_str(separator);
            }
            out.push_str(&link);
        }

        (out, exact)
    }

    fn join_lines(&self, lines: &[String]) -> String {
        let mut out = String::new();
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                out.push_str(LINE_BREAK);
            }
            out.push_str(&self.style.size_wrapper);
            out.push_str(line);
        }
        out
    }
}

/// Locate translated link phrases in order, as character ranges tagged with their visual line
fn anchor_phrases(text: &str, link_lines: &[usize], phrases: &[String]) -> Vec<PhraseAnchor> {
    let mut anchors = Vec::new();
    let mut cursor = 0;

    for (line, phrase) in link_lines.iter().zip(phrases) {
        if let Some((start, end)) = find_case_insensitive(&text[cursor..], phrase) {
            let (start, end) = (cursor + start, cursor + end);
            anchors.push(PhraseAnchor {
                start: text[..start].chars().count(),
                end: text[..end].chars().count(),
                line: *line,
            });
            cursor = end;
        }
    }

    anchors
}

/// Remove link phrases that landed in another line's chunk
///
/// A phrase missing from its own chunk is cut from the first other chunk holding it,
/// unless that chunk has a link with the same phrase. Returns the lines phrases were cut from.
fn recover_drifted_phrases(chunks: &mut [String], link_lines: &[usize], phrases: &[String]) -> Vec<usize> {
    let owns_phrase = |line: usize, phrase: &str| {
        link_lines
            .iter()
            .zip(phrases)
            .any(|(owner, other)| *owner == line && other.to_lowercase() == phrase.to_lowercase())
    };

    let mut moved_from = Vec::new();
    for (own, phrase) in link_lines.iter().zip(phrases) {
        if *own >= chunks.len() || find_case_insensitive(&chunks[*own], phrase).is_some() {
            continue;
        }
        for other in 0..chunks.len() {
            if other == *own || owns_phrase(other, phrase) {
                continue;
            }
            if let Some((start, end)) = find_case_insensitive(&chunks[other], phrase) {
                chunks[other] = cut_phrase(&chunks[other], start, end);
                moved_from.push(other);
                break;
            }
        }
    }

    moved_from
}

// Drop `chunk[start..end]`, keeping a single space where the phrase sat between words
fn cut_phrase(chunk: &str, start: usize, end: usize) -> String {
    let before = &chunk[..start];
    let after = &chunk[end..];
    let spaced = before.ends_with(char::is_whitespace) || after.starts_with(char::is_whitespace);
    let before = before.trim_end();
    let after = after.trim_start();

    if spaced && !before.is_empty() && !after.is_empty() && !after.starts_with(is_break_punctuation) {
        format!("{} {}", before, after)
    } else {
        format!("{}{}", before, after)
    }
}

/// Collapse line terminators in provider output into single spaces
pub fn normalize_translation(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive search returning byte offsets of the first match
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        let mut end = start;
        for (offset, c) in haystack[start..].char_indices() {
            let lowered: Vec<char> = c.to_lowercase().collect();
            if needle.len() < matched + lowered.len() || needle[matched..matched + lowered.len()] != lowered[..] {
                break;
            }
            matched += lowered.len();
            end = start + offset + c.len_utf8();
            if matched == needle.len() {
                return Some((start, end));
            }
        }
    }

    None
}
