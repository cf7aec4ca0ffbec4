/*!
 * Machine translation providers.
 *
 * This module contains the client side of the translation step:
 * - OpenAI: chat completions API integration
 * - Mock: scripted translator for tests and dry runs
 * - Prompt: prompt text shared by LLM-backed providers
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod mock;
pub mod openai;
pub mod prompt;

/// One clean text to translate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Rendered slot key, used as context for the model
    pub key: String,
    /// Dialogue identifier of the line, if any
    pub dialogue_id: Option<String>,
    /// Clean text without markup
    pub text: String,
}

impl TranslationRequest {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            dialogue_id: None,
            text: text.into(),
        }
    }

    pub fn with_dialogue_id(mut self, dialogue_id: Option<String>) -> Self {
        self.dialogue_id = dialogue_id;
        self
    }
}

/// Common trait for all translation providers
///
/// Providers receive plain text and return plain text; markup never crosses this boundary.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate one clean text
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}
