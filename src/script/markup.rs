/*!
 * Inline markup tokenizer.
 *
 * Scans a line for the closed set of recognized tags (`<br>`, `<link="ID">`, `</link>`),
 * strips the metadata family (ruby, size, color and the simple emphasis tags) and keeps
 * every other angle-bracket run as literal text while flagging it.
 *
 * Offsets are counted in characters (Unicode scalar values), not bytes.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Any bracketed run without nested angle brackets
static TAG_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^<>]*>").expect("Invalid tag candidate regex")
});

static LINE_BREAK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^<br\s*/?\s*>$").expect("Invalid line break regex")
});

static LINK_OPEN_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^<link\s*=\s*"([^"]*)"\s*>$"#).expect("Invalid link open regex")
});

static LINK_CLOSE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^</link\s*>$").expect("Invalid link close regex")
});

static METADATA_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^</?(?:ruby|rb|rt|rp|r|size|color|b|i|u|s)(?:\s*=[^>]*|\s+[^>]*)?\s*>$")
        .expect("Invalid metadata tag regex")
});

/// Kind of a recognized tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TagKind {
    /// `<br>`, `<br/>` or `<br />`
    LineBreak,
    /// `<link="ID">`
    LinkOpen,
    /// `</link>`
    LinkClose,
}

/// A recognized tag and where it occurred in the line before stripping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOccurrence {
    pub kind: TagKind,
    /// Link identifier, only present for `LinkOpen`
    pub attribute: Option<String>,
    /// Character offset of the tag in the original line
    pub offset: usize,
    /// The tag exactly as written
    pub source: String,
}

/// An angle-bracket run that is not part of the recognized or metadata sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownTag {
    pub text: String,
    pub offset: usize,
}

/// One element of the token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of literal text; adjacent runs are merged
    Text(String),
    /// A recognized tag
    Tag(TagOccurrence),
}

/// Result of tokenizing a line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<Token>,
    pub unknown_tags: Vec<UnknownTag>,
}

impl TokenizedLine {
    /// Recognized tag occurrences ordered by offset
    pub fn occurrences(&self) -> impl Iterator<Item = &TagOccurrence> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Tag(tag) => Some(tag),
            Token::Text(_) => None,
        })
    }

    /// Concatenated text of the line with every recognized tag removed
    pub fn plain_text(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Text(text) => Some(text.as_str()),
                Token::Tag(_) => None,
            })
            .collect()
    }

    /// Number of tags of the given kind
    pub fn count(&self, kind: TagKind) -> usize {
        self.occurrences().filter(|tag| tag.kind == kind).count()
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Token::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(Token::Text(text.to_string()));
        }
    }
}

/// Tokenize a whole line
pub fn tokenize(text: &str) -> TokenizedLine {
    tokenize_at(text, 0)
}

/// Tokenize a slice of a line whose first character sits at `base_offset`
pub fn tokenize_at(text: &str, base_offset: usize) -> TokenizedLine {
    let mut line = TokenizedLine::default();
    let mut cursor = 0;
    let mut char_offset = base_offset;

    for candidate in TAG_CANDIDATE.find_iter(text) {
        let before = &text[cursor..candidate.start()];
        line.push_text(before);
        char_offset += before.chars().count();

        let tag = candidate.as_str();
        let offset = char_offset;

        if LINE_BREAK_TAG.is_match(tag) {
            line.tokens.push(Token::Tag(TagOccurrence {
                kind: TagKind::LineBreak,
                attribute: None,
                offset,
                source: tag.to_string(),
            }));
        } else if let Some(captures) = LINK_OPEN_TAG.captures(tag) {
            line.tokens.push(Token::Tag(TagOccurrence {
                kind: TagKind::LinkOpen,
                attribute: captures.get(1).map(|m| m.as_str().to_string()),
                offset,
                source: tag.to_string(),
            }));
        } else if LINK_CLOSE_TAG.is_match(tag) {
            line.tokens.push(Token::Tag(TagOccurrence {
                kind: TagKind::LinkClose,
                attribute: None,
                offset,
                source: tag.to_string(),
            }));
        } else if METADATA_TAG.is_match(tag) {
            // Stripped without a trace
        } else {
            line.push_text(tag);
            line.unknown_tags.push(UnknownTag {
                text: tag.to_string(),
                offset,
            });
        }

        char_offset += tag.chars().count();
        cursor = candidate.end();
    }

    line.push_text(&text[cursor..]);
    line
}
