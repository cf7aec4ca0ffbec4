/*!
 * Translate pass: fills pending slots through a translation provider.
 *
 * Requests run concurrently up to a configured limit. Transient provider errors
 * are retried with exponential backoff; an empty answer counts as a failure and
 * is never stored.
 */

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::errors::{ProviderError, RegistryError};
use crate::providers::{TranslationRequest, Translator};
use crate::registry::{SlotRegistry, SlotStore, TranslationSlot};
use crate::script::reinsertion::normalize_translation;

/// Counts from one translate pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateSummary {
    pub requested: usize,
    pub translated: usize,
    pub failed: usize,
    /// Keys that could not be translated, with the last error
    pub failures: Vec<(String, String)>,
}

/// Translation pass over the pending slots of a registry
pub struct TranslatePass<T: Translator + ?Sized> {
    translator: Arc<T>,
    concurrent_requests: usize,
    retry_count: u32,
    retry_backoff_ms: u64,
    progress: Option<ProgressBar>,
}

impl<T: Translator + ?Sized + 'static> TranslatePass<T> {
    pub fn new(translator: Arc<T>, concurrent_requests: usize) -> Self {
        Self {
            translator,
            concurrent_requests: concurrent_requests.max(1),
            retry_count: 3,
            retry_backoff_ms: 1000,
            progress: None,
        }
    }

    pub fn with_retry(mut self, retry_count: u32, retry_backoff_ms: u64) -> Self {
        self.retry_count = retry_count;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Translate up to `limit` pending slots and store the results
    pub async fn run<S: SlotStore>(
        &self,
        registry: &SlotRegistry<S>,
        limit: usize,
    ) -> Result<TranslateSummary, RegistryError> {
        let pending = registry.pending_slots(limit)?;
        let mut summary = TranslateSummary {
            requested: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            info!("No pending slots to translate");
            return Ok(summary);
        }

        info!(
            "Translating {} slots with {} ({} concurrent requests)",
            pending.len(),
            self.translator.name(),
            self.concurrent_requests
        );
        if let Some(progress) = &self.progress {
            progress.set_length(pending.len() as u64);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrent_requests));

        let mut results = stream::iter(pending)
            .map(|slot| {
                let semaphore = semaphore.clone();
                let translator = self.translator.clone();
                let progress = self.progress.clone();
                let retry_count = self.retry_count;
                let retry_backoff_ms = self.retry_backoff_ms;

                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => translate_with_retry(translator.as_ref(), &slot, retry_count, retry_backoff_ms).await,
                        Err(e) => Err(ProviderError::RequestFailed(e.to_string())),
                    };
                    if let Some(progress) = &progress {
                        progress.inc(1);
                    }
                    (slot, result)
                }
            })
            .buffer_unordered(self.concurrent_requests);

        // Each answer is stored as soon as it arrives so an aborted run keeps finished work
        while let Some((slot, result)) = results.next().await {
            match result {
                Ok(text) => {
                    registry.record_translation(&slot.key, &text)?;
                    summary.translated += 1;
                }
                Err(e) => {
                    error!("Failed to translate {}: {}", slot.key, e);
                    summary.failed += 1;
                    summary.failures.push((slot.key.to_string(), e.to_string()));
                }
            }
        }

        summary.failures.sort();

        if let Some(progress) = &self.progress {
            progress.finish_with_message("Translated");
        }
        info!(
            "Translate pass done: {} translated, {} failed",
            summary.translated, summary.failed
        );

        Ok(summary)
    }
}

async fn translate_with_retry<T: Translator + ?Sized>(
    translator: &T,
    slot: &TranslationSlot,
    retry_count: u32,
    retry_backoff_ms: u64,
) -> Result<String, ProviderError> {
    let request = TranslationRequest::new(slot.key.to_string(), slot.original_text.clone())
        .with_dialogue_id(slot.dialogue_id.clone());

    let mut attempt = 0;
    loop {
        let error = match translator.translate(&request).await {
            Ok(text) => {
                let text = normalize_translation(&text);
                if !text.trim().is_empty() {
                    debug!("Translated {}", slot.key);
                    return Ok(text);
                }
                ProviderError::ParseError("empty translation".to_string())
            }
            Err(e) => e,
        };

        if !error.is_transient() || attempt >= retry_count {
            return Err(error);
        }

        let delay = retry_backoff_ms.saturating_mul(1u64 << attempt.min(16));
        warn!(
            "Attempt {} for {} failed ({}), retrying in {} ms",
            attempt + 1,
            slot.key,
            error,
            delay
        );
        tokio::time::sleep(Duration::from_millis(delay)).await;
        attempt += 1;
    }
}
