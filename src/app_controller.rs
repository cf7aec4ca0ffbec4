use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::app_config::{Config, TranslationProvider};
use crate::exchange::{self, ImportSummary, ReviewReport};
use crate::pipeline::{BatchRunner, BatchSummary, ScriptFile, TranslatePass, TranslateSummary};
use crate::providers::mock::MockTranslator;
use crate::providers::openai::{OpenAI, OpenAISettings};
use crate::providers::Translator;
use crate::registry::{DatabaseConnection, RegistryStats, SlotKey, SlotRegistry, SlotRepository};
use crate::script::reinsertion::ReinsertionEngine;
use crate::script::{LineRebuilder, Severity};
use crate::validation::ValidationService;

// @module: Application controller for script localization

/// Main application controller driving the localization passes
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Slot registry shared with the batch workers
    registry: Arc<SlotRegistry<SlotRepository>>,
}

impl Controller {
    /// Create a controller over an in-memory registry
    pub fn new_for_test() -> Result<Self> {
        Self::with_repository(Config::default(), SlotRepository::new_in_memory()?)
    }

    // @method: Create a controller opening the configured slot database
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let db_path = config.database_path()?;
        info!("Using slot database {:?}", db_path);
        let connection = DatabaseConnection::new(&db_path)
            .with_context(|| format!("Failed to open slot database {:?}", db_path))?;
        Self::with_repository(config, SlotRepository::new(connection))
    }

    pub fn with_repository(config: Config, repository: SlotRepository) -> Result<Self> {
        Ok(Self {
            config,
            registry: Arc::new(SlotRegistry::new(repository)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SlotRegistry<SlotRepository> {
        &self.registry
    }

    fn discover(&self) -> Result<Vec<ScriptFile>> {
        let pipeline = &self.config.pipeline;
        let files = ScriptFile::discover(&pipeline.original_dir, &pipeline.file_extension)?;
        if files.is_empty() {
            warn!(
                "No .{} files found in {:?}",
                pipeline.file_extension, pipeline.original_dir
            );
        }
        Ok(files)
    }

    fn runner(&self) -> BatchRunner {
        BatchRunner::new(self.config.pipeline.max_parallel_files)
    }

    /// Extract every source script and register its slots
    pub async fn extract(&self) -> Result<BatchSummary> {
        let files = self.discover()?;
        let summary = self.runner().extract_all(&files, self.registry.clone()).await?;

        info!(
            "Extracted {} files: {} slots created, {} errors, {} warnings",
            summary.files(),
            summary.slots_created(),
            summary.count(Severity::Error),
            summary.count(Severity::Warning)
        );
        Ok(summary)
    }

    /// Translation provider selected by the configuration
    pub fn create_translator(&self) -> Result<Arc<dyn Translator>> {
        let translation = &self.config.translation;
        match translation.provider {
            TranslationProvider::OpenAI => {
                self.config.validate_for_translation()?;
                Ok(Arc::new(OpenAI::new(OpenAISettings {
                    api_key: translation.get_api_key(),
                    endpoint: translation.endpoint.clone(),
                    model: translation.model.clone(),
                    temperature: translation.temperature,
                    reasoning_effort: translation.reasoning_effort.clone(),
                    timeout_secs: translation.timeout_secs,
                    source_language: self.config.source_language.clone(),
                    target_language: self.config.target_language.clone(),
                    knowledge_base: translation.knowledge_base.clone(),
                })))
            }
            TranslationProvider::Mock => Ok(Arc::new(MockTranslator::working())),
        }
    }

    /// Translate up to `limit` pending slots with the configured provider
    pub async fn translate(&self, limit: usize) -> Result<TranslateSummary> {
        let translator = self.create_translator()?;
        translator
            .test_connection()
            .await
            .map_err(|e| anyhow!("{} is not reachable: {}", translator.name(), e))?;

        info!(
            "vnloc: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.model
        );
        self.translate_with(translator, limit, true).await
    }

    /// Translate up to `limit` pending slots with an explicit translator
    pub async fn translate_with(
        &self,
        translator: Arc<dyn Translator>,
        limit: usize,
        show_progress: bool,
    ) -> Result<TranslateSummary> {
        let translation = &self.config.translation;
        let mut pass = TranslatePass::new(translator, translation.concurrent_requests)
            .with_retry(translation.retry_count, translation.retry_backoff_ms);

        if show_progress {
            let progress_bar = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} slots ({percent}%) {msg} {eta}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            progress_bar.set_style(style.progress_chars("#>-"));
            progress_bar.set_message("Translating");
            pass = pass.with_progress(progress_bar);
        }

        Ok(pass.run(self.registry.as_ref(), limit).await?)
    }

    /// Rebuild every source script into the translated directory
    pub async fn build(&self) -> Result<BatchSummary> {
        let files = self.discover()?;
        let rebuilder = LineRebuilder::new(ReinsertionEngine::new(self.config.markup.reinsertion_style()));
        let validator = ValidationService::new(self.config.validation.clone());

        let summary = self
            .runner()
            .rebuild_all(
                &files,
                self.registry.clone(),
                Arc::new(rebuilder),
                Arc::new(validator),
                self.config.pipeline.translated_dir.clone(),
                self.config.pipeline.write_bom,
            )
            .await?;

        info!(
            "Built {} files into {:?}: {} lines written, {} lines excluded",
            summary.files(),
            self.config.pipeline.translated_dir,
            summary.written_lines(),
            summary.excluded_lines()
        );
        Ok(summary)
    }

    /// Stale and untranslated rows
    pub fn review(&self) -> Result<ReviewReport> {
        ReviewReport::build(self.registry.as_ref())
    }

    /// Accept the current translation of a stale slot
    pub fn mark_reviewed(&self, key: &str) -> Result<()> {
        let key: SlotKey = key.parse()?;
        self.registry.mark_reviewed(&key)?;
        info!("Marked {} as reviewed", key);
        Ok(())
    }

    pub fn export<P: AsRef<Path>>(&self, path: P, file_id: Option<&str>) -> Result<usize> {
        exchange::export_to_file(self.registry.as_ref(), path, file_id)
    }

    pub fn import<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary> {
        exchange::import_from_file(self.registry.as_ref(), path)
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(self.registry.stats()?)
    }
}
