use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::providers::prompt::DEFAULT_KNOWLEDGE_BASE;
use crate::script::reinsertion::ReinsertionStyle;
use crate::validation::ValidationConfig;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Decorative markup emitted on structured lines
    #[serde(default)]
    pub markup: MarkupConfig,

    /// File locations and batch settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI chat completions
    #[default]
    OpenAI,
    // @provider: Offline echo translator
    Mock,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Mock => "Mock",
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Machine translation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    // @field: Active provider
    #[serde(default)]
    pub provider: TranslationProvider,

    // @field: Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    // @field: API key, falls back to OPENAI_API_KEY
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Base URL, empty for the public API
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Requests in flight at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Attempts after the first failure
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Initial backoff, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Sampling temperature, omitted when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    // @field: Reasoning effort hint for reasoning models
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: Option<String>,

    // @field: Project notes sent as the system prompt
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: Vec<String>,
}

impl TranslationConfig {
    /// Get the API key, consulting the environment when none is configured
    pub fn get_api_key(&self) -> String {
        if !self.api_key.trim().is_empty() {
            return self.api_key.clone();
        }
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            model: default_openai_model(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            concurrent_requests: default_concurrent_requests(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: None,
            reasoning_effort: default_reasoning_effort(),
            knowledge_base: default_knowledge_base(),
        }
    }
}

/// Decorative markup settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MarkupConfig {
    // @field: Emitted at the start of a structured body and after each line break
    #[serde(default = "default_size_wrapper")]
    pub size_wrapper: String,

    // @field: Emitted inside a link before its phrase
    #[serde(default = "default_link_style_open")]
    pub link_style_open: String,

    // @field: Emitted inside a link after its phrase
    #[serde(default = "default_link_style_close")]
    pub link_style_close: String,
}

impl MarkupConfig {
    pub fn reinsertion_style(&self) -> ReinsertionStyle {
        ReinsertionStyle {
            size_wrapper: self.size_wrapper.clone(),
            link_style_open: self.link_style_open.clone(),
            link_style_close: self.link_style_close.clone(),
        }
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            size_wrapper: default_size_wrapper(),
            link_style_open: default_link_style_open(),
            link_style_close: default_link_style_close(),
        }
    }
}

/// File locations and batch settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    // @field: Directory holding the source scripts
    #[serde(default = "default_original_dir")]
    pub original_dir: PathBuf,

    // @field: Directory receiving rebuilt scripts
    #[serde(default = "default_translated_dir")]
    pub translated_dir: PathBuf,

    // @field: Slot database, default under the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    // @field: Script file extension without the dot
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    // @field: Files processed at once
    #[serde(default = "default_max_parallel_files")]
    pub max_parallel_files: usize,

    // @field: Prefix rebuilt files with a UTF-8 byte order mark
    #[serde(default = "default_true")]
    pub write_bom: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            original_dir: default_original_dir(),
            translated_dir: default_translated_dir(),
            database_path: None,
            file_extension: default_file_extension(),
            max_parallel_files: default_max_parallel_files(),
            write_bom: true,
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "vi".to_string()
}

fn default_openai_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_reasoning_effort() -> Option<String> {
    Some("minimal".to_string())
}

fn default_knowledge_base() -> Vec<String> {
    DEFAULT_KNOWLEDGE_BASE.iter().map(|note| note.to_string()).collect()
}

fn default_size_wrapper() -> String {
    "<size=90%>".to_string()
}

fn default_link_style_open() -> String {
    "<color=#F2B035>".to_string()
}

fn default_link_style_close() -> String {
    "</color>".to_string()
}

fn default_original_dir() -> PathBuf {
    PathBuf::from("original")
}

fn default_translated_dir() -> PathBuf {
    PathBuf::from("translated")
}

fn default_file_extension() -> String {
    "txt".to_string()
}

fn default_max_parallel_files() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return Err(anyhow!("Source and target languages must be set"));
        }
        if self.markup.size_wrapper.trim().is_empty() {
            return Err(anyhow!("markup.size_wrapper must not be empty"));
        }
        if self.markup.link_style_open.trim().is_empty() != self.markup.link_style_close.trim().is_empty() {
            return Err(anyhow!("markup.link_style_open and link_style_close must be set together"));
        }
        if self.pipeline.max_parallel_files == 0 {
            return Err(anyhow!("pipeline.max_parallel_files must be at least 1"));
        }
        if self.pipeline.file_extension.trim().is_empty() {
            return Err(anyhow!("pipeline.file_extension must not be empty"));
        }
        if self.translation.concurrent_requests == 0 {
            return Err(anyhow!("translation.concurrent_requests must be at least 1"));
        }
        Ok(())
    }

    /// Additional checks before calling a translation provider
    pub fn validate_for_translation(&self) -> Result<()> {
        self.validate()?;
        if self.translation.provider == TranslationProvider::OpenAI
            && self.translation.get_api_key().trim().is_empty()
        {
            return Err(anyhow!(
                "Translation API key is required for OpenAI provider (set translation.api_key or {})",
                API_KEY_ENV
            ));
        }
        Ok(())
    }

    /// Slot database location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.pipeline.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::registry::DatabaseConnection::default_database_path(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            markup: MarkupConfig::default(),
            pipeline: PipelineConfig::default(),
            validation: ValidationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
