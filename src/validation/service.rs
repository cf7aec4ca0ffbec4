/*!
 * Validation service that runs the output validators over rebuilt lines.
 */

use serde::{Deserialize, Serialize};

use crate::script::diagnostics::Diagnostic;
use crate::script::extractor::ExtractionRecord;

use super::markers::MarkerValidator;
use super::script_purity::ScriptPurityValidator;

/// Configuration for the validation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether validation is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to recount line breaks and links in rebuilt lines
    #[serde(default = "default_true")]
    pub marker_validation: bool,

    /// Whether to look for untranslated source-script characters
    #[serde(default = "default_true")]
    pub script_purity_validation: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            marker_validation: true,
            script_purity_validation: true,
        }
    }
}

/// Runs the enabled validators over one rebuilt line
#[derive(Debug, Clone, Default)]
pub struct ValidationService {
    config: ValidationConfig,
    purity: ScriptPurityValidator,
}

impl ValidationService {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            purity: ScriptPurityValidator::default(),
        }
    }

    pub fn with_purity_validator(mut self, purity: ScriptPurityValidator) -> Self {
        self.purity = purity;
        self
    }

    /// Validate the body of a rebuilt line against its extraction record
    pub fn validate_line(&self, record: &ExtractionRecord, rebuilt_body: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if !self.config.enabled {
            return diagnostics;
        }

        if self.config.marker_validation {
            let result = MarkerValidator::validate(&record.tag_layout, rebuilt_body);
            if let Some(message) = result.error_message() {
                diagnostics.push(Diagnostic::LossyReinsertion {
                    line_index: record.line_index,
                    detail: message,
                });
            }
        }

        if self.config.script_purity_validation {
            if let Some(sample) = self.purity.residual_sample(rebuilt_body) {
                diagnostics.push(Diagnostic::ResidualSourceScript {
                    line_index: record.line_index,
                    sample,
                });
            }
        }

        diagnostics
    }
}
