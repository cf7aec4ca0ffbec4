/*!
 * Marker validation for rebuilt lines.
 *
 * Re-tokenizes a rebuilt body and checks that it carries exactly the line breaks and
 * link constructs recorded in the source layout, with link identifiers in order.
 */

use log::debug;

use crate::script::extractor::TagLayout;
use crate::script::markup::{self, TagKind};

/// Marker validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerValidationResult {
    pub expected_breaks: usize,
    pub found_breaks: usize,
    pub expected_links: Vec<String>,
    pub found_links: Vec<String>,
    /// Link opens without a close, or the reverse
    pub unbalanced_links: bool,
}

impl MarkerValidationResult {
    /// Check if validation passed
    pub fn passed(&self) -> bool {
        self.expected_breaks == self.found_breaks
            && self.expected_links == self.found_links
            && !self.unbalanced_links
    }

    /// Description of the first mismatch, if any
    pub fn error_message(&self) -> Option<String> {
        if self.expected_breaks != self.found_breaks {
            return Some(format!(
                "expected {} line breaks, found {}",
                self.expected_breaks, self.found_breaks
            ));
        }
        if self.expected_links != self.found_links {
            return Some(format!(
                "expected links {:?}, found {:?}",
                self.expected_links, self.found_links
            ));
        }
        if self.unbalanced_links {
            return Some("unbalanced link tags".to_string());
        }
        None
    }
}

/// Marker validator for rebuilt structured lines
pub struct MarkerValidator;

impl MarkerValidator {
    /// Compare the markers of a rebuilt body against the source layout
    pub fn validate(layout: &TagLayout, rebuilt_body: &str) -> MarkerValidationResult {
        let tokens = markup::tokenize(rebuilt_body);

        let found_links: Vec<String> = tokens
            .occurrences()
            .filter(|tag| tag.kind == TagKind::LinkOpen)
            .map(|tag| tag.attribute.clone().unwrap_or_default())
            .collect();

        let result = MarkerValidationResult {
            expected_breaks: layout.line_break_count(),
            found_breaks: tokens.count(TagKind::LineBreak),
            expected_links: layout
                .links()
                .into_iter()
                .map(|(attribute, _)| attribute.to_string())
                .collect(),
            unbalanced_links: found_links.len() != tokens.count(TagKind::LinkClose),
            found_links,
        };

        if !result.passed() {
            debug!("Marker validation failed: {:?}", result.error_message());
        }

        result
    }
}
