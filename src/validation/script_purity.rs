/*!
 * Residual source-script detection.
 *
 * A pure check over a final output string: does any character of the source
 * writing system survive? Markup is ignored so tag attributes never trigger it.
 */

use crate::script::markup;

/// Maximum number of offending characters quoted in a sample
const SAMPLE_LENGTH: usize = 12;

/// Character class predicate
pub type ScriptPredicate = fn(char) -> bool;

/// Kana, CJK ideographs and half-width katakana
pub fn is_japanese_script(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'     // Hiragana
        | '\u{30A0}'..='\u{30FF}'   // Katakana
        | '\u{31F0}'..='\u{31FF}'   // Katakana phonetic extensions
        | '\u{3400}'..='\u{4DBF}'   // CJK extension A
        | '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}'   // CJK compatibility ideographs
        | '\u{FF66}'..='\u{FF9F}'   // Half-width katakana
    )
}

/// Validator flagging characters matched by a predicate
#[derive(Debug, Clone, Copy)]
pub struct ScriptPurityValidator {
    predicate: ScriptPredicate,
}

impl Default for ScriptPurityValidator {
    fn default() -> Self {
        Self::new(is_japanese_script)
    }
}

impl ScriptPurityValidator {
    pub fn new(predicate: ScriptPredicate) -> Self {
        Self { predicate }
    }

    /// Offending characters in order of appearance, at most a short sample
    pub fn residual_sample(&self, text: &str) -> Option<String> {
        let visible = markup::tokenize(text).plain_text();
        let sample: String = visible
            .chars()
            .filter(|c| (self.predicate)(*c))
            .take(SAMPLE_LENGTH)
            .collect();

        if sample.is_empty() { None } else { Some(sample) }
    }

    pub fn is_clean(&self, text: &str) -> bool {
        self.residual_sample(text).is_none()
    }
}
