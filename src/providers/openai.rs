/*!
 * OpenAI chat completions client.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompt::{build_system_prompt, build_user_prompt};
use super::{TranslationRequest, Translator};
use crate::errors::ProviderError;

/// Public API endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Settings for the OpenAI translator
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    /// Base URL without the `/v1/...` path; empty for the public API
    pub endpoint: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub reasoning_effort: Option<String>,
    pub timeout_secs: u64,
    pub source_language: String,
    pub target_language: String,
    pub knowledge_base: Vec<String>,
}

/// OpenAI client translating one clean text per request
pub struct OpenAI {
    client: Client,
    settings: OpenAISettings,
    system_prompt: String,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("endpoint", &self.api_url())
            .field("model", &self.settings.model)
            .finish()
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(settings: OpenAISettings) -> Self {
        let system_prompt = build_system_prompt(&settings.knowledge_base);
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_secs))
                .build()
                .unwrap_or_default(),
            settings,
            system_prompt,
        }
    }

    fn api_url(&self) -> String {
        let base = if self.settings.endpoint.trim().is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.settings.endpoint.trim_end_matches('/')
        };
        format!("{}/v1/chat/completions", base)
    }

    fn build_request(&self, user_prompt: String) -> ChatRequest {
        ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            temperature: self.settings.temperature,
            reasoning_effort: self.settings.reasoning_effort.clone(),
        }
    }

    /// Send a chat completion request
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.settings.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message,
                },
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Translator for OpenAI {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let prompt = build_user_prompt(
            request,
            &self.settings.source_language,
            &self.settings.target_language,
        );
        debug!("Requesting translation of {}", request.key);

        let response = self.complete(&self.build_request(prompt)).await?;
        let text = response
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::ParseError("Empty completion".to_string()))?;

        Ok(text.to_string())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = self.build_request("Reply with OK.".to_string());
        self.complete(&request).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
